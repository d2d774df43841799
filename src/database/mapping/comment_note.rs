use crate::database::core::{Row, Value};
use crate::database::mapping::{LatLon, RowMapper};
use crate::error::Result;

/// A comment the user wrote on an existing note, not yet uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNote {
    pub note_id: i64,
    pub position: LatLon,
    pub text: String,
    pub image_paths: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CommentNoteMapping;

impl RowMapper<CommentNote> for CommentNoteMapping {
    fn to_domain(&self, row: &Row) -> Result<CommentNote> {
        let image_paths = match row.get_opt_blob("image_paths")? {
            Some(blob) => Some(serde_json::from_slice(blob)?),
            None => None,
        };

        Ok(CommentNote {
            note_id: row.get_i64("note_id")?,
            position: LatLon::new(row.get_f64("latitude")?, row.get_f64("longitude")?),
            text: row.get_text("text")?.to_string(),
            image_paths,
        })
    }

    fn to_row(&self, note: &CommentNote) -> Result<Row> {
        let image_paths = match &note.image_paths {
            Some(paths) => Value::Blob(serde_json::to_vec(paths)?),
            None => Value::Null,
        };

        Ok(Row::new()
            .with("note_id", note.note_id)
            .with("latitude", note.position.latitude)
            .with("longitude", note.position.longitude)
            .with("text", note.text.clone())
            .with("image_paths", image_paths))
    }
}
