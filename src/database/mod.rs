//! Database module
//!
//! This module provides all database functionality for surveydb, organized into:
//!
//! - **core**: SQLite connection, the statement executor boundary, and the
//!   schema registry for the current version
//! - **mapping**: row mappers for data that has to be decoded and re-encoded
//!   while a table changes shape
//! - **migration**: the version gate and the ordered migration step chain
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── connection  # SQLite DatabaseConn wrapper
//! │   ├── executor    # StatementExecutor trait, Row, Value
//! │   └── schema      # Registry and SchemaManager
//! │
//! ├── mapping/        # Row <-> domain conversions
//! │   ├── geometry    # elements_geometry
//! │   └── comment_note
//! │
//! ├── migration/      # Upgrading older stores
//! │   ├── gate        # create / upgrade / nothing / refuse
//! │   ├── steps       # one entry per schema version
//! │   ├── ops         # column additions, rebuilds, reshapes
//! │   └── legacy      # superseded table shapes
//! │
//! └── store           # SurveyDatabase entry point
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use surveydb::database::SurveyDatabase;
//!
//! // Creates the schema on a new file, upgrades an older one
//! let db = SurveyDatabase::open_in_dir("~/.surveydb")?;
//! println!("{:?}", db.outcome());
//! ```

pub mod core;
pub mod mapping;
pub mod migration;
mod store;

pub use core::{
    DatabaseConn, Row, SchemaDefinitions, SchemaManager, SchemaStatus, StatementExecutor,
    TableDefinition, Value, ViewDefinition, CURRENT_SCHEMA_VERSION,
};

pub use migration::{
    planned_steps, AppliesWhen, GateAction, MigrationContext, MigrationStep, OpenOutcome,
    MIGRATION_STEPS,
};

pub use store::{StoreOptions, SurveyDatabase, DEFAULT_DATABASE_FILE};

/// Ensure the data directory exists
pub fn ensure_data_dir(data_dir: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory '{}': {}", data_dir, e))
}
