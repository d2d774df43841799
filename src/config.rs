use anyhow::{anyhow, Result};
use config::Config;
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::database::core::{DatabaseConn, SchemaDefinitions, StatementExecutor};
use crate::database::migration::gate::{self, GateAction};
use crate::database::DEFAULT_DATABASE_FILE;

pub struct SurveyConfig {
    /// Path to the directory holding the store file
    pub data_dir: String,

    /// Store file name inside `data_dir`
    pub database_file: String,

    /// Enforce foreign keys once a store is open (default: true)
    pub foreign_keys: bool,
}

const EMPTY_CONFIG: &str = r#"### surveydb configuration file

### directory holding the survey database
# data_dir = "~/.surveydb"

### database file name inside data_dir
# database_file = "surveydb.sqlite3"

### enforce foreign keys after the store is opened
# foreign_keys = true
"#;

impl Default for SurveyConfig {
    fn default() -> Self {
        let home_dir = dirs::home_dir()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());

        Self {
            data_dir: format!("{}/.surveydb", home_dir),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
            foreign_keys: true,
        }
    }
}

impl SurveyConfig {
    /// Load the configuration file (by default `~/.surveydb/surveydb.toml`,
    /// written from a commented template when missing), then apply
    /// `SURVEYDB_*` environment overrides.
    pub fn new(path: &Option<String>) -> Result<SurveyConfig> {
        let defaults = SurveyConfig::default();
        let config_file = match path {
            Some(p) => PathBuf::from(p),
            None => {
                std::fs::create_dir_all(&defaults.data_dir)
                    .map_err(|e| anyhow!("Unable to create {}: {}", defaults.data_dir, e))?;
                Path::new(&defaults.data_dir).join("surveydb.toml")
            }
        };

        let mut builder = Config::builder();
        if config_file.exists() {
            builder = builder.add_source(config::File::from(config_file.as_path()));
        } else {
            std::fs::write(&config_file, EMPTY_CONFIG).map_err(|e| {
                anyhow!("Unable to create config file {}: {}", config_file.display(), e)
            })?;
        }

        // E.g., `SURVEYDB_DATA_DIR=/tmp/survey surveydb status`
        let settings = builder
            .add_source(config::Environment::with_prefix("SURVEYDB"))
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_map(&config, defaults)
    }

    fn from_map(config: &HashMap<String, String>, defaults: SurveyConfig) -> Result<SurveyConfig> {
        let foreign_keys = match config.get("foreign_keys") {
            Some(v) => v
                .parse()
                .map_err(|_| anyhow!("foreign_keys must be true or false, got '{}'", v))?,
            None => defaults.foreign_keys,
        };

        Ok(SurveyConfig {
            data_dir: config.get("data_dir").cloned().unwrap_or(defaults.data_dir),
            database_file: config
                .get("database_file")
                .cloned()
                .unwrap_or(defaults.database_file),
            foreign_keys,
        })
    }

    /// Get the path to the SQLite database file
    pub fn sqlite_path(&self) -> String {
        let data_dir = self.data_dir.trim_end_matches('/');
        format!("{}/{}", data_dir, self.database_file)
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        [
            format!("Data Directory:     {}", self.data_dir),
            format!("SQLite Path:        {}", self.sqlite_path()),
            format!("Foreign Keys:       {}", self.foreign_keys),
        ]
        .join("\n")
    }
}

/// Row count of one table in an inspected store
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub rows: u64,
}

/// What a store file looks like without opening it for writing
#[derive(Debug, Serialize, Clone)]
pub struct StoreInfo {
    pub path: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_version: Option<u32>,
    pub target_version: u32,
    /// What opening the store would do; `None` when it would be refused
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<GateAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub tables: Vec<TableInfo>,
}

/// Inspect the store file at `path` read-only.
pub fn get_store_info(path: &str, target_version: u32) -> Result<StoreInfo> {
    let exists = Path::new(path).exists();
    let size_bytes = if exists {
        std::fs::metadata(path).ok().map(|m| m.len())
    } else {
        None
    };

    let mut info = StoreInfo {
        path: path.to_string(),
        exists,
        size_bytes,
        stored_version: None,
        target_version,
        action: None,
        error: None,
        tables: Vec::new(),
    };

    if !exists {
        info.action = Some(GateAction::Create);
        return Ok(info);
    }

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| anyhow!("Unable to open {} read-only: {}", path, e))?;
    let db = DatabaseConn::from_connection(conn);

    let stored = gate::stored_version(&db)?;
    info.stored_version = stored;
    match gate::decide(stored, target_version) {
        Ok(action) => info.action = Some(action),
        Err(e) => info.error = Some(e.to_string()),
    }

    for table in SchemaDefinitions::TABLES {
        if db.table_exists(table.name)? {
            info.tables.push(TableInfo {
                name: table.name.to_string(),
                rows: db.table_count(table.name)?,
            });
        }
    }

    Ok(info)
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{SurveyDatabase, CURRENT_SCHEMA_VERSION};
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = SurveyConfig::default();
        assert!(config.foreign_keys);
        assert_eq!(config.database_file, "surveydb.sqlite3");
        assert!(config.data_dir.ends_with(".surveydb"));
    }

    #[test]
    fn test_paths() {
        let config = SurveyConfig {
            data_dir: "/test/dir/".to_string(),
            database_file: "store.db".to_string(),
            foreign_keys: true,
        };

        assert_eq!(config.sqlite_path(), "/test/dir/store.db");
    }

    #[test]
    fn test_from_map() {
        let map = HashMap::from([
            ("data_dir".to_string(), "/data".to_string()),
            ("foreign_keys".to_string(), "false".to_string()),
        ]);
        let config = SurveyConfig::from_map(&map, SurveyConfig::default()).unwrap();

        assert_eq!(config.data_dir, "/data");
        assert_eq!(config.database_file, DEFAULT_DATABASE_FILE);
        assert!(!config.foreign_keys);

        let bad = HashMap::from([("foreign_keys".to_string(), "sometimes".to_string())]);
        assert!(SurveyConfig::from_map(&bad, SurveyConfig::default()).is_err());

        let empty = SurveyConfig::from_map(&HashMap::new(), SurveyConfig::default()).unwrap();
        assert_eq!(empty.data_dir, SurveyConfig::default().data_dir);
        assert!(empty.foreign_keys);
    }

    #[test]
    fn test_new_writes_template() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("surveydb.toml");
        let path_str = Some(path.to_string_lossy().to_string());

        SurveyConfig::new(&path_str).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, EMPTY_CONFIG);
    }

    #[test]
    fn test_store_info_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("none.sqlite3");

        let info = get_store_info(path.to_str().unwrap(), CURRENT_SCHEMA_VERSION).unwrap();

        assert!(!info.exists);
        assert_eq!(info.action, Some(GateAction::Create));
        assert!(!path.exists());
    }

    #[test]
    fn test_store_info_current_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.sqlite3");
        let path = path.to_str().unwrap();
        SurveyDatabase::open(path).unwrap();

        let info = get_store_info(path, CURRENT_SCHEMA_VERSION).unwrap();

        assert_eq!(info.stored_version, Some(CURRENT_SCHEMA_VERSION));
        assert_eq!(info.action, Some(GateAction::Nothing));
        assert_eq!(info.tables.len(), SchemaDefinitions::TABLES.len());
        assert!(info.tables.iter().all(|t| t.rows == 0));

        let info = get_store_info(path, 20).unwrap();
        assert!(info.action.is_none());
        assert!(info.error.is_some());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }
}
