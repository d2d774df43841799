use clap::Args;
use surveydb::database::GateAction;
use surveydb::{format_size, get_store_info, OutputFormat, StoreInfo, SurveyConfig};
use tabled::Tabled;

use super::print_rows;

/// Arguments for the Status command
#[derive(Args)]
pub struct StatusArgs {
    /// Schema version to compare the store against, defaults to the current one
    #[clap(long)]
    pub target: Option<u32>,
}

#[derive(Tabled)]
struct TableRow {
    table: String,
    rows: u64,
}

fn describe_action(info: &StoreInfo) -> String {
    match (&info.action, &info.error) {
        (Some(GateAction::Create), _) => "create schema".to_string(),
        (Some(GateAction::Nothing), _) => "none, schema is current".to_string(),
        (Some(GateAction::Upgrade { from, to }), _) => format!("upgrade v{} -> v{}", from, to),
        (None, Some(e)) => format!("refused: {}", e),
        (None, None) => "unknown".to_string(),
    }
}

pub fn run(config: &SurveyConfig, path: &str, args: StatusArgs, output_format: OutputFormat) {
    let target = args.target.unwrap_or(surveydb::CURRENT_SCHEMA_VERSION);

    let info = match get_store_info(path, target) {
        Ok(info) => info,
        Err(e) => {
            eprintln!("ERROR: Failed to inspect {}: {}", path, e);
            std::process::exit(1);
        }
    };

    if !output_format.is_json() {
        println!("Survey Database Status");
        println!("======================\n");
        println!("{}\n", config.summary());
        println!("  Path:           {}", info.path);
        println!(
            "  Status:         {}",
            if info.exists { "exists" } else { "not created" }
        );
        if let Some(size) = info.size_bytes {
            println!("  Size:           {}", format_size(size));
        }
        match info.stored_version {
            Some(v) => println!("  Stored version: v{}", v),
            None => println!("  Stored version: -"),
        }
        println!("  Target version: v{}", info.target_version);
        println!("  On open:        {}\n", describe_action(&info));
        if info.tables.is_empty() {
            return;
        }
    }

    let rows: Vec<TableRow> = info
        .tables
        .iter()
        .map(|t| TableRow {
            table: t.name.clone(),
            rows: t.rows,
        })
        .collect();
    print_rows(output_format, rows, &info);
}
