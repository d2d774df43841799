//! Statement execution boundary
//!
//! Migration steps never touch a `rusqlite::Connection` directly. They receive
//! a `&dyn StatementExecutor`, which keeps the data flow and transaction scope
//! of every step explicit and lets steps run against any store fixture.

use crate::error::{Error, Result};

pub use rusqlite::types::Value;

/// A decoded row: ordered `(column, value)` pairs.
///
/// Columns are looked up by name, never by position, so a row read through an
/// explicit column list decodes the same regardless of the table's physical
/// column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used by row mappers.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Set `column`, replacing an existing value of the same name.
    pub fn push(&mut self, column: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.values.iter_mut().find(|(name, _)| name == column) {
            Some((_, existing)) => *existing = value,
            None => self.values.push((column.to_string(), value)),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().map(|(_, value)| value)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    fn require(&self, column: &str) -> Result<&Value> {
        self.get(column)
            .ok_or_else(|| Error::inconsistent(format!("row has no column '{}'", column)))
    }

    pub fn get_i64(&self, column: &str) -> Result<i64> {
        match self.require(column)? {
            Value::Integer(v) => Ok(*v),
            other => Err(type_mismatch(column, "integer", other)),
        }
    }

    /// Reads a REAL column; integers are widened since SQLite may store
    /// whole-number doubles as INTEGER.
    pub fn get_f64(&self, column: &str) -> Result<f64> {
        match self.require(column)? {
            Value::Real(v) => Ok(*v),
            Value::Integer(v) => Ok(*v as f64),
            other => Err(type_mismatch(column, "real", other)),
        }
    }

    pub fn get_text(&self, column: &str) -> Result<&str> {
        match self.require(column)? {
            Value::Text(v) => Ok(v.as_str()),
            other => Err(type_mismatch(column, "text", other)),
        }
    }

    pub fn get_opt_text(&self, column: &str) -> Result<Option<&str>> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Text(v) => Ok(Some(v.as_str())),
            other => Err(type_mismatch(column, "text", other)),
        }
    }

    pub fn get_opt_blob(&self, column: &str) -> Result<Option<&[u8]>> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Blob(v) => Ok(Some(v.as_slice())),
            // Serialized payloads written as TEXT by older builds
            Value::Text(v) => Ok(Some(v.as_bytes())),
            other => Err(type_mismatch(column, "blob", other)),
        }
    }
}

fn type_mismatch(column: &str, expected: &str, found: &Value) -> Error {
    Error::inconsistent(format!(
        "column '{}' expected {}, found {:?}",
        column,
        expected,
        found.data_type()
    ))
}

/// Abstraction over the embedded store used by schema creation and migration.
pub trait StatementExecutor {
    /// Execute a single DDL/DML statement, returning the number of changed rows.
    fn execute(&self, sql: &str) -> Result<usize>;

    /// Execute a single statement with positional parameters.
    fn execute_with_params(&self, sql: &str, args: &[Value]) -> Result<usize>;

    /// Select `columns` (all columns when `None`) from `table`, optionally
    /// filtered by `where_clause` with positional `args`.
    fn query(
        &self,
        table: &str,
        columns: Option<&[&str]>,
        where_clause: Option<&str>,
        args: &[Value],
    ) -> Result<Vec<Row>>;

    /// Insert `row` into `table`; fails on a constraint conflict.
    fn insert(&self, table: &str, row: &Row) -> Result<i64>;

    /// Delete rows matching `where_clause` (all rows when `None`).
    fn delete(&self, table: &str, where_clause: Option<&str>, args: &[Value]) -> Result<usize>;

    /// Run `block` atomically. Transactions nest; an inner failure rolls back
    /// only the inner block before the error propagates.
    fn transaction(
        &self,
        block: &mut dyn FnMut(&dyn StatementExecutor) -> Result<()>,
    ) -> Result<()>;

    /// Whether `table` has `column`. A missing table is an inconsistency,
    /// not a `false`.
    fn has_column(&self, table: &str, column: &str) -> Result<bool>;

    fn table_exists(&self, table: &str) -> Result<bool>;

    fn view_exists(&self, view: &str) -> Result<bool>;

    fn table_count(&self, table: &str) -> Result<u64>;

    /// Version recorded in the store's own metadata; 0 for a new store.
    fn schema_version(&self) -> Result<u32>;

    fn set_schema_version(&self, version: u32) -> Result<()>;
}
