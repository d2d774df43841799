use clap::Args;
use serde::Serialize;
use surveydb::database::migration::gate::decide;
use surveydb::database::{planned_steps, AppliesWhen, GateAction};
use surveydb::{get_store_info, OutputFormat};
use tabled::Tabled;

use super::print_rows;

/// Arguments for the Plan command
#[derive(Args)]
pub struct PlanArgs {
    /// Version to upgrade from, defaults to the version stored in the database
    #[clap(long)]
    pub from: Option<u32>,

    /// Version to upgrade to, defaults to the current one
    #[clap(long)]
    pub to: Option<u32>,
}

#[derive(Tabled, Serialize)]
struct PlannedStep {
    version: u32,
    when: String,
    description: &'static str,
}

pub fn run(path: &str, args: PlanArgs, output_format: OutputFormat) {
    let to = args.to.unwrap_or(surveydb::CURRENT_SCHEMA_VERSION);
    let from = match args.from {
        Some(v) => v,
        None => match get_store_info(path, to) {
            Ok(info) => info.stored_version.unwrap_or(0),
            Err(e) => {
                eprintln!("ERROR: Failed to inspect {}: {}", path, e);
                std::process::exit(1);
            }
        },
    };

    let stored = (from != 0).then_some(from);
    let creates = match decide(stored, to) {
        Ok(GateAction::Create) => {
            eprintln!("A new store is created at v{} directly, no steps run", to);
            true
        }
        Ok(GateAction::Nothing) => {
            eprintln!("Store is already at v{}", to);
            false
        }
        Ok(GateAction::Upgrade { .. }) => false,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let steps: Vec<PlannedStep> = planned_steps(from, to)
        .into_iter()
        .filter(|_| !creates)
        .map(|step| PlannedStep {
            version: step.version,
            when: match step.applies_when {
                AppliesWhen::Reaching => format!("reaching v{}", step.version),
                AppliesWhen::UpgradingFrom(v) => format!("from v{} only", v),
            },
            description: step.description,
        })
        .collect();

    let json = serde_json::json!({ "from": from, "to": to, "steps": &steps });
    print_rows(output_format, steps, &json);
}
