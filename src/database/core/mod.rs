//! Core database infrastructure
//!
//! This module provides the foundational database components the migration engine is built on:
//! - `StatementExecutor`: the statement-execution boundary, with `Row`/`Value`
//! - `DatabaseConn`: SQLite connection wrapper implementing `StatementExecutor`
//! - `SchemaDefinitions`: registry of the current tables and views
//! - `SchemaManager`: schema creation and inspection
//! - `SchemaStatus`: Schema state enumeration

mod connection;
mod executor;
mod schema;

pub use connection::DatabaseConn;
pub use executor::{Row, StatementExecutor, Value};
pub use schema::{
    SchemaDefinitions, SchemaManager, SchemaStatus, TableDefinition, ViewDefinition,
    CURRENT_SCHEMA_VERSION,
};
