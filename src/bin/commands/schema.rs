use serde::Serialize;
use surveydb::database::SchemaDefinitions;
use surveydb::{OutputFormat, SchemaManager, CURRENT_SCHEMA_VERSION};

#[derive(Serialize)]
struct SchemaDump {
    version: u32,
    tables: Vec<TableDump>,
    views: Vec<&'static str>,
}

#[derive(Serialize)]
struct TableDump {
    name: &'static str,
    columns: &'static [&'static str],
}

pub fn run(output_format: OutputFormat) {
    if output_format.is_json() {
        let dump = SchemaDump {
            version: CURRENT_SCHEMA_VERSION,
            tables: SchemaDefinitions::TABLES
                .iter()
                .map(|t| TableDump {
                    name: t.name,
                    columns: t.columns,
                })
                .collect(),
            views: SchemaDefinitions::VIEWS.iter().map(|v| v.name).collect(),
        };
        match output_format.to_json(&dump) {
            Some(Ok(json)) => println!("{}", json),
            Some(Err(e)) => eprintln!("ERROR: Failed to serialize to JSON: {}", e),
            None => {}
        }
        return;
    }

    println!("-- schema v{}", CURRENT_SCHEMA_VERSION);
    for sql in SchemaManager::schema_sql() {
        println!("{}\n", sql);
    }
}
