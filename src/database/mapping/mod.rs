//! Row mappers
//!
//! Conversions between stored rows and the domain values a migration step has
//! to decode and re-encode when a table's data is reshaped, not just copied.

mod comment_note;
mod geometry;

pub use comment_note::{CommentNote, CommentNoteMapping};
pub use geometry::{
    BoundingBox, ElementGeometry, ElementGeometryEntry, ElementGeometryMapping, ElementType,
    LatLon,
};

use crate::database::core::{Row, StatementExecutor, Value};
use crate::error::Result;

/// Bidirectional conversion between a row and a domain value.
pub trait RowMapper<T> {
    fn to_domain(&self, row: &Row) -> Result<T>;

    fn to_row(&self, value: &T) -> Result<Row>;
}

/// Query `table` through an explicit column list and decode every row.
pub fn query_mapped<T>(
    exec: &dyn StatementExecutor,
    mapper: &dyn RowMapper<T>,
    table: &str,
    columns: &[&str],
    where_clause: Option<&str>,
    args: &[Value],
) -> Result<Vec<T>> {
    exec.query(table, Some(columns), where_clause, args)?
        .iter()
        .map(|row| mapper.to_domain(row))
        .collect()
}

/// Encode every value and insert it into `table`, returning the number inserted.
pub fn insert_mapped<T>(
    exec: &dyn StatementExecutor,
    mapper: &dyn RowMapper<T>,
    table: &str,
    values: &[T],
) -> Result<usize> {
    for value in values {
        exec.insert(table, &mapper.to_row(value)?)?;
    }
    Ok(values.len())
}
