use clap::Args;
use surveydb::database::{ensure_data_dir, planned_steps, StoreOptions};
use surveydb::{OpenOutcome, OutputFormat, SurveyConfig, SurveyDatabase};
use tracing::info;

/// Arguments for the Migrate command
#[derive(Args)]
pub struct MigrateArgs {
    /// Schema version to bring the store to, defaults to the current one
    #[clap(long)]
    pub target: Option<u32>,
}

pub fn run(config: &SurveyConfig, path: &str, args: MigrateArgs, output_format: OutputFormat) {
    let options = StoreOptions {
        target_version: args.target.unwrap_or(surveydb::CURRENT_SCHEMA_VERSION),
        foreign_keys: config.foreign_keys,
    };

    if let Err(e) = ensure_data_dir(&config.data_dir) {
        eprintln!("ERROR: {}", e);
        std::process::exit(1);
    }

    info!("migrating {} to v{}", path, options.target_version);
    let db = match SurveyDatabase::open_with_options(path, options) {
        Ok(db) => db,
        Err(e) => {
            match e.failed_version() {
                Some(v) => eprintln!("ERROR: migration stopped at v{}: {}", v, e),
                None => eprintln!("ERROR: {}", e),
            }
            std::process::exit(1);
        }
    };

    let outcome = db.outcome();
    match output_format.to_json(&outcome) {
        Some(Ok(json)) => println!("{}", json),
        Some(Err(e)) => eprintln!("ERROR: Failed to serialize to JSON: {}", e),
        None => match outcome {
            OpenOutcome::Created { version } => {
                println!("Created schema v{} at {}", version, path)
            }
            OpenOutcome::Unchanged { version } => {
                println!("Schema at {} is already v{}", path, version)
            }
            OpenOutcome::Upgraded { from, to, steps } => {
                println!("Upgraded {} from v{} to v{} in {} steps:", path, from, to, steps);
                for step in planned_steps(from, to) {
                    println!("  v{:<3} {}", step.version, step.description);
                }
            }
        },
    }
}
