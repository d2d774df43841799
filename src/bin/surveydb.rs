use clap::{Parser, Subcommand};
use surveydb::{OutputFormat, SurveyConfig};
use tracing::Level;

mod commands;

use commands::migrate::MigrateArgs;
use commands::plan::PlanArgs;
use commands::status::StatusArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.surveydb/surveydb.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// database file, by default the one in the configured data directory
    #[clap(short, long, global = true)]
    database: Option<String>,

    /// Print debug information
    #[clap(long, global = true)]
    debug: bool,

    /// Output format: table, markdown, json, json-pretty
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the store's version, what opening it would do, and row counts
    Status(StatusArgs),

    /// Open the store, creating or upgrading its schema
    Migrate(MigrateArgs),

    /// List the migration steps an upgrade would run
    Plan(PlanArgs),

    /// Print the current schema
    Schema,
}

fn main() {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .init();
    }

    let config = match SurveyConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };
    let path = cli.database.unwrap_or_else(|| config.sqlite_path());

    match cli.command {
        Commands::Status(args) => commands::status::run(&config, &path, args, cli.format),
        Commands::Migrate(args) => commands::migrate::run(&config, &path, args, cli.format),
        Commands::Plan(args) => commands::plan::run(&path, args, cli.format),
        Commands::Schema => commands::schema::run(cli.format),
    }
}
