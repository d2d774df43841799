//! Database connection management
//!
//! This module provides the SQLite connection wrapper the migration engine runs on.

use std::cell::Cell;

use rusqlite::{params_from_iter, Connection};
use tracing::{debug, warn};

use crate::database::core::executor::{Row, StatementExecutor, Value};
use crate::error::{Error, Result};

/// Core database connection wrapper
///
/// `DatabaseConn` provides a thin wrapper around SQLite connections,
/// handling both file-based and in-memory databases with consistent
/// configuration. It is the production [`StatementExecutor`].
pub struct DatabaseConn {
    pub conn: Connection,
    savepoint_depth: Cell<u32>,
}

impl DatabaseConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)?,
            None => Connection::open_in_memory()?,
        };

        let db = Self::from_connection(conn);
        db.configure()?;
        Ok(db)
    }

    /// Wrap an already opened connection without touching its settings.
    pub fn from_connection(conn: Connection) -> Self {
        DatabaseConn {
            conn,
            savepoint_depth: Cell::new(0),
        }
    }

    /// Open a database at the specified path (convenience method)
    pub fn open_path(path: &str) -> Result<Self> {
        Self::open(Some(path))
    }

    /// Create an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(None)
    }

    fn configure(&self) -> Result<()> {
        // in-memory databases answer "memory" here
        let mode: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        debug!("journal mode: {}", mode);

        self.conn.execute("PRAGMA synchronous=NORMAL", [])?;
        self.conn.execute("PRAGMA temp_store=MEMORY", [])?;

        Ok(())
    }

    /// Toggle foreign key enforcement.
    ///
    /// SQLite ignores this pragma inside an open transaction, so it must be
    /// called before or after an upgrade, never during one.
    pub fn set_foreign_keys(&self, enabled: bool) -> Result<()> {
        let value = if enabled { "ON" } else { "OFF" };
        self.conn
            .execute_batch(&format!("PRAGMA foreign_keys={}", value))?;
        Ok(())
    }

    pub fn foreign_keys_enabled(&self) -> Result<bool> {
        let enabled: i64 = self
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
        Ok(enabled != 0)
    }

    fn object_exists(&self, kind: &str, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type=?1 AND name=?2",
            [kind, name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

/// An open savepoint on a [`DatabaseConn`]. Rolled back on drop unless
/// released, so a panicking block does not leave it open.
struct Savepoint<'a> {
    db: &'a DatabaseConn,
    name: String,
    depth: u32,
    finished: bool,
}

impl<'a> Savepoint<'a> {
    fn begin(db: &'a DatabaseConn) -> Result<Self> {
        let depth = db.savepoint_depth.get();
        let name = format!("surveydb_sp{}", depth);
        db.conn.execute_batch(&format!("SAVEPOINT {}", name))?;
        db.savepoint_depth.set(depth + 1);
        Ok(Self {
            db,
            name,
            depth,
            finished: false,
        })
    }

    fn release(mut self) -> Result<()> {
        self.db
            .conn
            .execute_batch(&format!("RELEASE {}", self.name))?;
        self.finished = true;
        Ok(())
    }

    fn rollback(mut self) {
        self.undo();
        self.finished = true;
    }

    fn undo(&self) {
        if let Err(e) = self
            .db
            .conn
            .execute_batch(&format!("ROLLBACK TO {name}; RELEASE {name}", name = self.name))
        {
            warn!("Failed to roll back savepoint {}: {}", self.name, e);
        }
    }
}

impl Drop for Savepoint<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.undo();
        }
        self.db.savepoint_depth.set(self.depth);
    }
}

impl StatementExecutor for DatabaseConn {
    fn execute(&self, sql: &str) -> Result<usize> {
        Ok(self.conn.execute(sql, [])?)
    }

    fn execute_with_params(&self, sql: &str, args: &[Value]) -> Result<usize> {
        Ok(self.conn.execute(sql, params_from_iter(args.iter()))?)
    }

    fn query(
        &self,
        table: &str,
        columns: Option<&[&str]>,
        where_clause: Option<&str>,
        args: &[Value],
    ) -> Result<Vec<Row>> {
        let projection = columns
            .map(|c| c.join(", "))
            .unwrap_or_else(|| "*".to_string());
        let mut sql = format!("SELECT {} FROM {}", projection, table);
        if let Some(clause) = where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(clause);
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut decoded = Row::new();
            for (idx, name) in names.iter().enumerate() {
                let value: Value = row.get(idx)?;
                decoded.push(name, value);
            }
            result.push(decoded);
        }
        Ok(result)
    }

    fn insert(&self, table: &str, row: &Row) -> Result<i64> {
        if row.is_empty() {
            return Err(Error::inconsistent(format!(
                "refusing to insert an empty row into '{}'",
                table
            )));
        }

        let columns: Vec<&str> = row.columns().collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut stmt = self.conn.prepare_cached(&sql)?;
        stmt.execute(params_from_iter(row.values()))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn delete(&self, table: &str, where_clause: Option<&str>, args: &[Value]) -> Result<usize> {
        let sql = match where_clause {
            Some(clause) => format!("DELETE FROM {} WHERE {}", table, clause),
            None => format!("DELETE FROM {}", table),
        };
        self.execute_with_params(&sql, args)
    }

    /// Raw `SAVEPOINT` SQL so that a step-level transaction nests inside the
    /// transaction wrapping the whole upgrade; rusqlite's `Savepoint` needs
    /// `&mut Connection`.
    fn transaction(
        &self,
        block: &mut dyn FnMut(&dyn StatementExecutor) -> Result<()>,
    ) -> Result<()> {
        let savepoint = Savepoint::begin(self)?;
        match block(self) {
            Ok(()) => savepoint.release(),
            Err(e) => {
                savepoint.rollback();
                Err(e)
            }
        }
    }

    fn has_column(&self, table: &str, column: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1)")?;
        let names = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if names.is_empty() {
            return Err(Error::inconsistent(format!(
                "cannot look up column '{}': table '{}' does not exist",
                column, table
            )));
        }
        Ok(names.iter().any(|name| name.eq_ignore_ascii_case(column)))
    }

    fn table_exists(&self, table: &str) -> Result<bool> {
        self.object_exists("table", table)
    }

    fn view_exists(&self, view: &str) -> Result<bool> {
        self.object_exists("view", view)
    }

    fn table_count(&self, table: &str) -> Result<u64> {
        let query = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = self.conn.query_row(&query, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn schema_version(&self) -> Result<u32> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        u32::try_from(version)
            .map_err(|_| Error::inconsistent(format!("invalid stored schema version {}", version)))
    }

    fn set_schema_version(&self, version: u32) -> Result<()> {
        self.conn
            .execute_batch(&format!("PRAGMA user_version = {}", version))?;
        Ok(())
    }
}
