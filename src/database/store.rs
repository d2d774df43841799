//! Survey database storage
//!
//! `SurveyDatabase` is the entry point that opens a store file, brings its
//! schema to the version this build targets and hands out the connection.

use std::path::Path;

use tracing::{debug, info};

use crate::database::core::{DatabaseConn, SchemaManager, SchemaStatus, CURRENT_SCHEMA_VERSION};
use crate::database::migration::{gate, MigrationContext, OpenOutcome};
use crate::error::Result;

/// File name used by [`SurveyDatabase::open_in_dir`]
pub const DEFAULT_DATABASE_FILE: &str = "surveydb.sqlite3";

/// How a store is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Schema version to bring the store to
    pub target_version: u32,
    /// Foreign key enforcement once the store is open
    pub foreign_keys: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            target_version: CURRENT_SCHEMA_VERSION,
            foreign_keys: true,
        }
    }
}

/// Main survey database
///
/// Opening a store creates the schema on a new file, upgrades an older one
/// through the migration chain, and refuses a store written by a newer build.
pub struct SurveyDatabase {
    db: DatabaseConn,
    outcome: OpenOutcome,
}

impl SurveyDatabase {
    /// Open the store at `path` and bring it to the current schema version
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with_options(path, StoreOptions::default())
    }

    /// Open the store at `path` and bring it to `target` instead of the
    /// current version
    pub fn open_with_target(path: &str, target: u32) -> Result<Self> {
        Self::open_with_options(
            path,
            StoreOptions {
                target_version: target,
                ..StoreOptions::default()
            },
        )
    }

    pub fn open_with_options(path: &str, options: StoreOptions) -> Result<Self> {
        debug!("opening survey database at {}", path);
        Self::from_connection(DatabaseConn::open_path(path)?, options)
    }

    /// Open the store in a data directory
    ///
    /// Uses the standard database file path: `{data_dir}/surveydb.sqlite3`
    pub fn open_in_dir(data_dir: &str) -> Result<Self> {
        let path = Path::new(data_dir).join(DEFAULT_DATABASE_FILE);
        Self::open(&path.to_string_lossy())
    }

    /// Create an in-memory store at the current version (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(DatabaseConn::open_in_memory()?, StoreOptions::default())
    }

    /// Run the version gate on an already opened connection
    ///
    /// Foreign keys are off for the whole upgrade and set from `options`
    /// afterwards, whether the upgrade succeeded or not.
    pub fn from_connection(db: DatabaseConn, options: StoreOptions) -> Result<Self> {
        db.set_foreign_keys(false)?;
        let result = gate::apply(&db, options.target_version, &MigrationContext::now());
        db.set_foreign_keys(options.foreign_keys)?;
        let outcome = result?;

        match outcome {
            OpenOutcome::Unchanged { version } => {
                info!("Survey database schema is current (v{})", version)
            }
            OpenOutcome::Created { version } => {
                info!("Initialized survey database schema v{}", version)
            }
            OpenOutcome::Upgraded { from, to, steps } => info!(
                "Survey database migrated from v{} to v{} in {} steps",
                from, to, steps
            ),
        }

        Ok(Self { db, outcome })
    }

    /// What opening this store did
    pub fn outcome(&self) -> OpenOutcome {
        self.outcome
    }

    pub fn version(&self) -> u32 {
        self.outcome.version()
    }

    /// Current schema status as the schema manager sees it
    pub fn status(&self) -> Result<SchemaStatus> {
        SchemaManager::new(&self.db).check_status(self.version())
    }

    /// Get the underlying database connection (for advanced queries)
    pub fn connection(&self) -> &rusqlite::Connection {
        &self.db.conn
    }

    pub fn executor(&self) -> &DatabaseConn {
        &self.db
    }
}
