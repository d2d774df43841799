#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! surveydb - versioned schema migration for a survey app's local store
//!
//! surveydb owns the SQLite store of an OpenStreetMap survey application: map
//! elements and their geometry, quests and their undo history, notes and the
//! user's statistics. Opening a store creates the current schema on a new
//! file, upgrades a store written by an older build through an ordered chain
//! of migration steps, and refuses a store written by a newer build.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Store opening, schema registry, migration chain | `rusqlite` |
//! | `display` | Table formatting with `tabled` | `tabled` |
//! | `cli` | The `surveydb` binary | All above + `clap`, `tracing-subscriber` |
//!
//! ```toml
//! # Library only
//! surveydb = { version = "0.1", default-features = false }
//! ```
//!
//! # Architecture
//!
//! - **[`database`]**: all database functionality
//!   - `core`: SQLite connection, `StatementExecutor`, schema registry
//!   - `mapping`: row mappers for reshaped tables
//!   - `migration`: version gate and migration steps
//! - **[`config`]**: configuration management and read-only store inspection
//! - **[`error`]**: the library error type
//! - **[`output`]**: output formats for the CLI
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use surveydb::database::{SurveyDatabase, OpenOutcome};
//!
//! let db = SurveyDatabase::open("/data/survey.sqlite3")?;
//! if let OpenOutcome::Upgraded { from, to, steps } = db.outcome() {
//!     println!("migrated v{} -> v{} in {} steps", from, to, steps);
//! }
//! ```
//!
//! Steps an upgrade would run can be listed without touching a store:
//!
//! ```rust,ignore
//! use surveydb::database::planned_steps;
//!
//! for step in planned_steps(15, 21) {
//!     println!("v{}: {}", step.version, step.description);
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod output;

pub use config::{format_size, get_store_info, StoreInfo, SurveyConfig, TableInfo};

pub use database::{
    DatabaseConn, GateAction, MigrationContext, OpenOutcome, SchemaDefinitions, SchemaManager,
    SchemaStatus, StatementExecutor, StoreOptions, SurveyDatabase, CURRENT_SCHEMA_VERSION,
};

pub use error::{Error, Result};

pub use output::OutputFormat;
