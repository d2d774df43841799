//! Database schema management
//!
//! This module holds the schema registry for the current schema version and the
//! `SchemaManager` that creates it on a fresh store and inspects an existing one.
//! Shapes superseded by later versions live in `database::migration::legacy`.

use crate::database::core::executor::StatementExecutor;
use crate::error::{Error, Result};

/// Current schema version
/// Increment this together with a new step in `database::migration::steps`
pub const CURRENT_SCHEMA_VERSION: u32 = 21;

/// A table in the registry: its name, its ordered column list, and its DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub create: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewDefinition {
    pub name: &'static str,
    pub create: &'static str,
}

/// Schema definitions for all tables in the current schema
pub struct SchemaDefinitions;

impl SchemaDefinitions {
    pub const ELEMENTS_GEOMETRY: TableDefinition = TableDefinition {
        name: "elements_geometry",
        columns: &[
            "element_type",
            "element_id",
            "geometry_polylines",
            "geometry_polygons",
            "latitude",
            "longitude",
            "min_latitude",
            "min_longitude",
            "max_latitude",
            "max_longitude",
        ],
        create: r#"
        CREATE TABLE IF NOT EXISTS elements_geometry (
            element_type varchar(255) NOT NULL,
            element_id int NOT NULL,
            geometry_polylines blob,
            geometry_polygons blob,
            latitude double NOT NULL,
            longitude double NOT NULL,
            min_latitude double NOT NULL,
            min_longitude double NOT NULL,
            max_latitude double NOT NULL,
            max_longitude double NOT NULL,
            CONSTRAINT primary_key PRIMARY KEY (element_type, element_id)
        );
        "#,
    };

    pub const OSM_QUESTS: TableDefinition = TableDefinition {
        name: "osm_quests",
        columns: &[
            "quest_id",
            "quest_type",
            "quest_status",
            "tag_changes",
            "changes_source",
            "last_update",
            "element_id",
            "element_type",
        ],
        create: r#"
        CREATE TABLE IF NOT EXISTS osm_quests (
            quest_id INTEGER PRIMARY KEY,
            quest_type varchar(255) NOT NULL,
            quest_status varchar(255) NOT NULL,
            tag_changes blob,
            changes_source varchar(255),
            last_update int NOT NULL,
            element_id int NOT NULL,
            element_type varchar(255) NOT NULL,
            CONSTRAINT same_osm_quest UNIQUE (quest_type, element_id, element_type),
            CONSTRAINT element_key FOREIGN KEY (element_type, element_id)
                REFERENCES elements_geometry (element_type, element_id)
        );
        "#,
    };

    pub const OSM_QUESTS_UNDO: TableDefinition = TableDefinition {
        name: "osm_quests_undo",
        columns: &[
            "quest_id",
            "quest_type",
            "tag_changes",
            "changes_source",
            "element_id",
            "element_type",
        ],
        create: r#"
        CREATE TABLE IF NOT EXISTS osm_quests_undo (
            quest_id INTEGER PRIMARY KEY,
            quest_type varchar(255) NOT NULL,
            tag_changes blob NOT NULL,
            changes_source varchar(255) NOT NULL,
            element_id int NOT NULL,
            element_type varchar(255) NOT NULL,
            CONSTRAINT element_key FOREIGN KEY (element_type, element_id)
                REFERENCES elements_geometry (element_type, element_id)
        );
        "#,
    };

    pub const OSM_NODES: TableDefinition = TableDefinition {
        name: "osm_nodes",
        columns: &["id", "version", "latitude", "longitude", "tags", "last_update"],
        create: r#"
        CREATE TABLE IF NOT EXISTS osm_nodes (
            id int PRIMARY KEY,
            version int NOT NULL,
            latitude double NOT NULL,
            longitude double NOT NULL,
            tags blob,
            last_update int NOT NULL
        );
        "#,
    };

    pub const OSM_WAYS: TableDefinition = TableDefinition {
        name: "osm_ways",
        columns: &["id", "version", "tags", "node_ids", "last_update"],
        create: r#"
        CREATE TABLE IF NOT EXISTS osm_ways (
            id int PRIMARY KEY,
            version int NOT NULL,
            tags blob,
            node_ids blob NOT NULL,
            last_update int NOT NULL
        );
        "#,
    };

    pub const OSM_RELATIONS: TableDefinition = TableDefinition {
        name: "osm_relations",
        columns: &["id", "version", "tags", "members", "last_update"],
        create: r#"
        CREATE TABLE IF NOT EXISTS osm_relations (
            id int PRIMARY KEY,
            version int NOT NULL,
            tags blob,
            members blob NOT NULL,
            last_update int NOT NULL
        );
        "#,
    };

    pub const OSM_NOTES: TableDefinition = TableDefinition {
        name: "osm_notes",
        columns: &[
            "id",
            "latitude",
            "longitude",
            "created",
            "closed",
            "status",
            "comments",
            "last_update",
        ],
        create: r#"
        CREATE TABLE IF NOT EXISTS osm_notes (
            id int PRIMARY KEY,
            latitude double NOT NULL,
            longitude double NOT NULL,
            created int NOT NULL,
            closed int,
            status varchar(255) NOT NULL,
            comments blob NOT NULL,
            last_update int NOT NULL
        );
        "#,
    };

    /// Ids of notes the user chose not to see as quests
    pub const OSM_NOTEQUESTS_HIDDEN: TableDefinition = TableDefinition {
        name: "osm_notequests_hidden",
        columns: &["note_id"],
        create: r#"
        CREATE TABLE IF NOT EXISTS osm_notequests_hidden (
            note_id INTEGER PRIMARY KEY
        );
        "#,
    };

    pub const OSM_CREATE_NOTES: TableDefinition = TableDefinition {
        name: "osm_create_notes",
        columns: &[
            "create_id",
            "latitude",
            "longitude",
            "element_type",
            "element_id",
            "text",
            "quest_title",
            "image_paths",
        ],
        create: r#"
        CREATE TABLE IF NOT EXISTS osm_create_notes (
            create_id INTEGER PRIMARY KEY,
            latitude double NOT NULL,
            longitude double NOT NULL,
            element_type varchar(255),
            element_id int,
            text text NOT NULL,
            quest_title text,
            image_paths blob
        );
        "#,
    };

    /// Comments to existing notes waiting for upload
    pub const OSM_COMMENT_NOTES: TableDefinition = TableDefinition {
        name: "osm_comment_notes",
        columns: &["note_id", "latitude", "longitude", "text", "image_paths"],
        create: r#"
        CREATE TABLE IF NOT EXISTS osm_comment_notes (
            note_id INTEGER PRIMARY KEY,
            latitude double NOT NULL,
            longitude double NOT NULL,
            text text NOT NULL,
            image_paths blob
        );
        "#,
    };

    pub const QUEST_STATISTICS: TableDefinition = TableDefinition {
        name: "quest_statistics",
        columns: &["quest_type", "succeeded"],
        create: r#"
        CREATE TABLE IF NOT EXISTS quest_statistics (
            quest_type varchar(255) PRIMARY KEY,
            succeeded int NOT NULL
        );
        "#,
    };

    pub const COUNTRY_STATISTICS: TableDefinition = TableDefinition {
        name: "country_statistics",
        columns: &["country_code", "succeeded", "rank"],
        create: r#"
        CREATE TABLE IF NOT EXISTS country_statistics (
            country_code varchar(255) PRIMARY KEY,
            succeeded int NOT NULL,
            rank int
        );
        "#,
    };

    pub const ACHIEVEMENTS: TableDefinition = TableDefinition {
        name: "achievements",
        columns: &["achievement", "level"],
        create: r#"
        CREATE TABLE IF NOT EXISTS achievements (
            achievement varchar(255) PRIMARY KEY,
            level int NOT NULL
        );
        "#,
    };

    pub const LINKS: TableDefinition = TableDefinition {
        name: "links",
        columns: &["link"],
        create: r#"
        CREATE TABLE IF NOT EXISTS links (
            link varchar(255) PRIMARY KEY
        );
        "#,
    };

    pub const NEW_ACHIEVEMENTS: TableDefinition = TableDefinition {
        name: "new_achievements",
        columns: &["achievement", "level"],
        create: r#"
        CREATE TABLE IF NOT EXISTS new_achievements (
            achievement varchar(255) NOT NULL,
            level int NOT NULL,
            CONSTRAINT primary_key PRIMARY KEY (achievement, level)
        );
        "#,
    };

    pub const DOWNLOADED_TILES: TableDefinition = TableDefinition {
        name: "downloaded_tiles",
        columns: &["x", "y", "quest_type", "date"],
        create: r#"
        CREATE TABLE IF NOT EXISTS downloaded_tiles (
            x int NOT NULL,
            y int NOT NULL,
            quest_type varchar(255) NOT NULL,
            date int NOT NULL,
            CONSTRAINT primary_key PRIMARY KEY (x, y, quest_type)
        );
        "#,
    };

    pub const OPEN_CHANGESETS: TableDefinition = TableDefinition {
        name: "open_changesets",
        columns: &["quest_type", "source", "changeset_id"],
        create: r#"
        CREATE TABLE IF NOT EXISTS open_changesets (
            quest_type varchar(255),
            source varchar(255),
            changeset_id int NOT NULL,
            CONSTRAINT primary_key PRIMARY KEY (quest_type, source)
        );
        "#,
    };

    pub const QUEST_VISIBILITY: TableDefinition = TableDefinition {
        name: "quest_visibility",
        columns: &["quest_type", "visibility"],
        create: r#"
        CREATE TABLE IF NOT EXISTS quest_visibility (
            quest_type varchar(255) PRIMARY KEY,
            visibility int NOT NULL
        );
        "#,
    };

    pub const OSM_SPLIT_WAYS: TableDefinition = TableDefinition {
        name: "osm_split_ways",
        columns: &["quest_id", "quest_type", "way_id", "splits", "source"],
        create: r#"
        CREATE TABLE IF NOT EXISTS osm_split_ways (
            quest_id INTEGER PRIMARY KEY,
            quest_type varchar(255) NOT NULL,
            way_id int NOT NULL,
            splits blob NOT NULL,
            source varchar(255) NOT NULL
        );
        "#,
    };

    pub const OSM_DELETE_ELEMENT: TableDefinition = TableDefinition {
        name: "osm_delete_element",
        columns: &["quest_id", "quest_type", "element_id", "element_type", "source"],
        create: r#"
        CREATE TABLE IF NOT EXISTS osm_delete_element (
            quest_id INTEGER PRIMARY KEY,
            quest_type varchar(255) NOT NULL,
            element_id int NOT NULL,
            element_type varchar(255) NOT NULL,
            source varchar(255) NOT NULL
        );
        "#,
    };

    pub const ROAD_NAMES: TableDefinition = TableDefinition {
        name: "road_names",
        columns: &[
            "way_id",
            "names",
            "geometry",
            "min_latitude",
            "min_longitude",
            "max_latitude",
            "max_longitude",
            "last_update",
        ],
        create: r#"
        CREATE TABLE IF NOT EXISTS road_names (
            way_id int PRIMARY KEY,
            names blob NOT NULL,
            geometry blob NOT NULL,
            min_latitude double NOT NULL,
            min_longitude double NOT NULL,
            max_latitude double NOT NULL,
            max_longitude double NOT NULL,
            last_update int NOT NULL
        );
        "#,
    };

    pub const WAY_TRAFFIC_FLOW: TableDefinition = TableDefinition {
        name: "oneway_suspects_traffic_flow",
        columns: &["way_id", "is_forward"],
        create: r#"
        CREATE TABLE IF NOT EXISTS oneway_suspects_traffic_flow (
            way_id int PRIMARY KEY,
            is_forward int NOT NULL
        );
        "#,
    };

    pub const OSM_QUESTS_FULL_VIEW: ViewDefinition = ViewDefinition {
        name: "osm_quests_full",
        create: r#"
        CREATE VIEW IF NOT EXISTS osm_quests_full AS
        SELECT * FROM osm_quests
        INNER JOIN elements_geometry USING (element_type, element_id);
        "#,
    };

    pub const OSM_QUESTS_UNDO_FULL_VIEW: ViewDefinition = ViewDefinition {
        name: "osm_quests_full_undo",
        create: r#"
        CREATE VIEW IF NOT EXISTS osm_quests_full_undo AS
        SELECT * FROM osm_quests_undo
        INNER JOIN elements_geometry USING (element_type, element_id);
        "#,
    };

    /// All tables in creation order
    pub const TABLES: &'static [TableDefinition] = &[
        Self::ELEMENTS_GEOMETRY,
        Self::OSM_QUESTS,
        Self::OSM_QUESTS_UNDO,
        Self::OSM_NODES,
        Self::OSM_WAYS,
        Self::OSM_RELATIONS,
        Self::OSM_NOTES,
        Self::OSM_NOTEQUESTS_HIDDEN,
        Self::OSM_CREATE_NOTES,
        Self::OSM_COMMENT_NOTES,
        Self::QUEST_STATISTICS,
        Self::COUNTRY_STATISTICS,
        Self::ACHIEVEMENTS,
        Self::LINKS,
        Self::NEW_ACHIEVEMENTS,
        Self::DOWNLOADED_TILES,
        Self::OPEN_CHANGESETS,
        Self::QUEST_VISIBILITY,
        Self::OSM_SPLIT_WAYS,
        Self::OSM_DELETE_ELEMENT,
        Self::ROAD_NAMES,
        Self::WAY_TRAFFIC_FLOW,
    ];

    /// Views, created after all tables they select from
    pub const VIEWS: &'static [ViewDefinition] =
        &[Self::OSM_QUESTS_FULL_VIEW, Self::OSM_QUESTS_UNDO_FULL_VIEW];
}

/// Schema manager for the local store
///
/// Handles schema creation, version checking, and integrity verification.
pub struct SchemaManager<'a> {
    exec: &'a dyn StatementExecutor,
}

impl<'a> SchemaManager<'a> {
    /// Create a new schema manager for the given executor
    pub fn new(exec: &'a dyn StatementExecutor) -> Self {
        Self { exec }
    }

    /// Create every registry table, then every view
    ///
    /// Any failure is reported as `CreationFailed`; callers run this inside a
    /// transaction so a failure leaves nothing behind.
    pub fn initialize(&self) -> Result<()> {
        self.create_all()
            .map_err(|e| Error::CreationFailed(Box::new(e)))
    }

    fn create_all(&self) -> Result<()> {
        for table in SchemaDefinitions::TABLES {
            self.exec.execute(table.create)?;
        }
        for view in SchemaDefinitions::VIEWS {
            self.exec.execute(view.create)?;
        }
        Ok(())
    }

    /// Check the current schema status against `target`
    pub fn check_status(&self, target: u32) -> Result<SchemaStatus> {
        let current_version = self.exec.schema_version()?;

        if current_version == 0 {
            return Ok(SchemaStatus::NotInitialized);
        }

        if current_version == target {
            if target != CURRENT_SCHEMA_VERSION || self.verify_integrity()? {
                Ok(SchemaStatus::Current)
            } else {
                Ok(SchemaStatus::Corrupted)
            }
        } else if current_version < target {
            Ok(SchemaStatus::NeedsMigration {
                from: current_version,
                to: target,
            })
        } else {
            // Database is from a newer version
            Ok(SchemaStatus::Incompatible {
                database_version: current_version,
                required_version: target,
            })
        }
    }

    /// Verify schema integrity by checking every registry table and view exists
    pub fn verify_integrity(&self) -> Result<bool> {
        Ok(self.missing_objects()?.is_empty())
    }

    /// Names of registry tables and views absent from the store
    pub fn missing_objects(&self) -> Result<Vec<&'static str>> {
        let mut missing = Vec::new();
        for table in SchemaDefinitions::TABLES {
            if !self.exec.table_exists(table.name)? {
                missing.push(table.name);
            }
        }
        for view in SchemaDefinitions::VIEWS {
            if !self.exec.view_exists(view.name)? {
                missing.push(view.name);
            }
        }
        Ok(missing)
    }

    /// Full DDL of the current schema, in creation order
    pub fn schema_sql() -> Vec<&'static str> {
        SchemaDefinitions::TABLES
            .iter()
            .map(|t| t.create.trim())
            .chain(SchemaDefinitions::VIEWS.iter().map(|v| v.create.trim()))
            .collect()
    }
}

/// Status of the database schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// Database is not initialized (fresh database)
    NotInitialized,

    /// Schema is current and valid
    Current,

    /// Schema needs migration from an older version
    NeedsMigration { from: u32, to: u32 },

    /// Database is from a newer version (incompatible)
    Incompatible {
        database_version: u32,
        required_version: u32,
    },

    /// Schema is at the current version but registry objects are missing
    Corrupted,
}
