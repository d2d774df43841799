//! Building blocks shared by migration steps
//!
//! Every helper here is safe to call again after it already took effect:
//! creates use `IF NOT EXISTS`, drops use `IF EXISTS`, and column additions
//! check for the column first.

use tracing::debug;

use crate::database::core::{StatementExecutor, TableDefinition, ViewDefinition};
use crate::database::mapping::{insert_mapped, query_mapped, RowMapper};
use crate::error::Result;

/// A column to add to an existing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnAddition<'a> {
    pub table: &'a str,
    pub column: &'a str,
    /// Type and constraints, e.g. `varchar(255)` or `int NOT NULL DEFAULT 0`
    pub definition: &'a str,
}

impl ColumnAddition<'_> {
    /// Add the column unless it is already there. Returns whether it was added.
    pub fn apply(&self, exec: &dyn StatementExecutor) -> Result<bool> {
        if exec.has_column(self.table, self.column)? {
            debug!("{}.{} already present, skipping", self.table, self.column);
            return Ok(false);
        }
        exec.execute(&format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            self.table, self.column, self.definition
        ))?;
        Ok(true)
    }
}

/// Column definition for a new `last_update` column, back-filled with the
/// time of the migration rather than the unknown historical value.
pub fn last_update_definition(now_millis: i64) -> String {
    format!("int NOT NULL DEFAULT {}", now_millis)
}

pub fn create_table(exec: &dyn StatementExecutor, table: &TableDefinition) -> Result<()> {
    exec.execute(table.create)?;
    Ok(())
}

pub fn create_view(exec: &dyn StatementExecutor, view: &ViewDefinition) -> Result<()> {
    exec.execute(view.create)?;
    Ok(())
}

pub fn drop_table(exec: &dyn StatementExecutor, name: &str) -> Result<()> {
    exec.execute(&format!("DROP TABLE IF EXISTS {}", name))?;
    Ok(())
}

pub fn drop_view(exec: &dyn StatementExecutor, name: &str) -> Result<()> {
    exec.execute(&format!("DROP VIEW IF EXISTS {}", name))?;
    Ok(())
}

/// Drop `table` and create it again from the registry, discarding its rows.
pub fn recreate_table(exec: &dyn StatementExecutor, table: &TableDefinition) -> Result<()> {
    drop_table(exec, table.name)?;
    create_table(exec, table)
}

/// Move `table` into a new shape SQLite cannot reach with `ALTER TABLE`.
///
/// The rows are parked in `<table>_old` through `columns`, the table is
/// recreated with `create`, and the rows are copied back through the same
/// explicit column list. Runs as one transaction.
pub fn rebuild_table(
    exec: &dyn StatementExecutor,
    table: &str,
    create: &str,
    columns: &[&str],
) -> Result<()> {
    let temp = format!("{}_old", table);
    let column_list = columns.join(", ");

    exec.transaction(&mut |tx| {
        drop_table(tx, &temp)?;
        tx.execute(&format!(
            "CREATE TABLE {} AS SELECT {} FROM {}",
            temp, column_list, table
        ))?;
        tx.execute(&format!("DROP TABLE {}", table))?;
        tx.execute(create)?;
        let copied = tx.execute(&format!(
            "INSERT INTO {} ({}) SELECT {} FROM {}",
            table, column_list, column_list, temp
        ))?;
        debug!("rebuilt {} with {} rows", table, copied);
        drop_table(tx, &temp)
    })
}

/// Decode every row of `table`, recreate it from the registry and re-insert
/// the snapshot through `mapper`. Runs as one transaction, so a failure keeps
/// the old table and its rows. Returns the number of rows carried over.
pub fn reshape_table<T>(
    exec: &dyn StatementExecutor,
    table: &TableDefinition,
    mapper: &dyn RowMapper<T>,
    read_columns: &[&str],
) -> Result<usize> {
    let mut carried = 0;
    exec.transaction(&mut |tx| {
        let snapshot = query_mapped(tx, mapper, table.name, read_columns, None, &[])?;
        recreate_table(tx, table)?;
        carried = insert_mapped(tx, mapper, table.name, &snapshot)?;
        Ok(())
    })?;
    Ok(carried)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::core::{DatabaseConn, Row, SchemaDefinitions};
    use crate::error::Error;

    fn test_db() -> DatabaseConn {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, extra TEXT)")
            .unwrap();
        db.execute("INSERT INTO items (id, name, extra) VALUES (1, 'a', 'x'), (2, 'b', 'y')")
            .unwrap();
        db
    }

    #[test]
    fn test_column_addition_is_idempotent() {
        let db = test_db();
        let add = ColumnAddition {
            table: "items",
            column: "source",
            definition: "varchar(255)",
        };

        assert!(add.apply(&db).unwrap());
        assert!(!add.apply(&db).unwrap());

        let count: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('items') WHERE name = 'source'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_column_addition_on_missing_table_fails() {
        let db = test_db();
        let add = ColumnAddition {
            table: "nope",
            column: "source",
            definition: "text",
        };

        assert!(matches!(add.apply(&db), Err(Error::InconsistentSchema(_))));
    }

    #[test]
    fn test_rebuild_drops_column_and_keeps_rows() {
        let db = test_db();

        rebuild_table(
            &db,
            "items",
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)",
            &["id", "name"],
        )
        .unwrap();

        assert!(!db.has_column("items", "extra").unwrap());
        assert!(!db.table_exists("items_old").unwrap());
        let rows = db.query("items", Some(&["id", "name"]), None, &[]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get_text("name").unwrap(), "b");
    }

    #[test]
    fn test_failed_rebuild_leaves_original() {
        let db = test_db();
        db.execute("INSERT INTO items (id, name) VALUES (3, 'a')").unwrap();

        // the duplicate name violates the new constraint
        let result = rebuild_table(
            &db,
            "items",
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)",
            &["id", "name"],
        );

        assert!(result.is_err());
        assert!(db.has_column("items", "extra").unwrap());
        assert_eq!(db.table_count("items").unwrap(), 3);
        assert!(!db.table_exists("items_old").unwrap());
    }

    #[test]
    fn test_recreate_discards_rows() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let table = SchemaDefinitions::OPEN_CHANGESETS;
        create_table(&db, &table).unwrap();
        db.execute("INSERT INTO open_changesets (quest_type, source, changeset_id) VALUES ('A', 'survey', 1)")
            .unwrap();

        recreate_table(&db, &table).unwrap();
        assert_eq!(db.table_count(table.name).unwrap(), 0);
    }

    struct UpperCase;

    impl RowMapper<String> for UpperCase {
        fn to_domain(&self, row: &Row) -> Result<String> {
            Ok(row.get_text("link")?.to_uppercase())
        }

        fn to_row(&self, value: &String) -> Result<Row> {
            if value == "FAIL" {
                return Err(Error::inconsistent("refusing"));
            }
            Ok(Row::new().with("link", value.clone()))
        }
    }

    #[test]
    fn test_reshape_rewrites_through_mapper() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let table = SchemaDefinitions::LINKS;
        create_table(&db, &table).unwrap();
        db.execute("INSERT INTO links (link) VALUES ('a'), ('b')").unwrap();

        let carried = reshape_table(&db, &table, &UpperCase, &["link"]).unwrap();

        assert_eq!(carried, 2);
        let rows = db.query("links", Some(&["link"]), Some("link = 'A'"), &[]).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_failed_reshape_rolls_back() {
        let db = DatabaseConn::open_in_memory().unwrap();
        let table = SchemaDefinitions::LINKS;
        create_table(&db, &table).unwrap();
        db.execute("INSERT INTO links (link) VALUES ('a'), ('fail'), ('c')")
            .unwrap();

        assert!(reshape_table(&db, &table, &UpperCase, &["link"]).is_err());

        let rows = db.query("links", Some(&["link"]), None, &[]).unwrap();
        let mut links: Vec<&str> = rows.iter().map(|r| r.get_text("link").unwrap()).collect();
        links.sort();
        assert_eq!(links, vec!["a", "c", "fail"]);
    }
}
