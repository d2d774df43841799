pub mod migrate;
pub mod plan;
pub mod schema;
pub mod status;

use serde::Serialize;
use surveydb::OutputFormat;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Print `rows` as a table, or `value` as JSON for the JSON formats.
pub(crate) fn print_rows<R: Tabled, V: Serialize>(
    output_format: OutputFormat,
    rows: Vec<R>,
    value: &V,
) {
    match output_format.to_json(value) {
        Some(Ok(json)) => println!("{}", json),
        Some(Err(e)) => eprintln!("ERROR: Failed to serialize to JSON: {}", e),
        None => {
            let mut table = Table::new(rows);
            match output_format {
                OutputFormat::Markdown => table.with(Style::markdown()),
                _ => table.with(Style::rounded()),
            };
            println!("{}", table);
        }
    }
}
