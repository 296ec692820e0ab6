mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::{ReferenceArgs, TuningArgs};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dgscan",
    version,
    about = "Dangerous goods detection and segregation checks for shipment manifests"
)]
struct Cli {
    /// Log pipeline progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect dangerous goods in a manifest (PDF, XLSX or plain text)
    Scan {
        /// Path to the manifest
        input_file: PathBuf,

        #[command(flatten)]
        reference: ReferenceArgs,

        #[command(flatten)]
        tuning: TuningArgs,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Run a validation session: apply decisions, check compatibility, finalize
    Validate {
        /// Path to the manifest
        input_file: PathBuf,

        #[command(flatten)]
        reference: ReferenceArgs,

        #[command(flatten)]
        tuning: TuningArgs,

        /// Confirm a candidate by id (repeatable)
        #[arg(long = "confirm", value_name = "ID")]
        confirm: Vec<String>,

        /// Reject a candidate by id (repeatable, applied after confirmations)
        #[arg(long = "reject", value_name = "ID")]
        reject: Vec<String>,

        /// Confirm the top candidate of every keyword cluster
        #[arg(long)]
        accept_top: bool,

        /// Acknowledge that the manifest carries no dangerous goods
        #[arg(long = "no-dg")]
        no_dg: bool,

        /// Operator recorded in the confirmation ledger
        #[arg(long, default_value = "cli")]
        user: String,

        /// Write the audit bundle to a JSON file
        #[arg(long, value_name = "FILE")]
        audit: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Check segregation compatibility of UN numbers
    Compat {
        /// UN numbers, with or without the "UN" prefix
        #[arg(required = true)]
        un_numbers: Vec<String>,

        #[command(flatten)]
        reference: ReferenceArgs,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Inspect dangerous goods catalogs
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Inspect segregation tables
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List predefined catalogs, or the entries of one
    List {
        /// Preset whose entries to list
        preset: Option<String>,
    },
    /// Show a catalog entry by UN number
    Show {
        un_number: String,
        #[command(flatten)]
        reference: ReferenceArgs,
    },
    /// Search the catalog by name, synonym or UN number
    Search {
        term: String,
        #[command(flatten)]
        reference: ReferenceArgs,
    },
    /// Validate a custom catalog file
    Validate {
        /// Path to JSON catalog file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// List predefined segregation tables
    List,
    /// Explain a segregation table in plain language
    Explain {
        /// Preset name (e.g., "adg-class")
        preset: String,
    },
    /// Validate a custom segregation table file
    Validate {
        /// Path to JSON segregation table file
        file: PathBuf,
    },
}

/// `RUST_LOG` wins when set; otherwise `--verbose` picks info over warn.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| {
            let level = if verbose {
                tracing::Level::INFO
            } else {
                tracing::Level::WARN
            };
            EnvFilter::new(level.as_str())
        })
}

fn init_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), verbose))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Scan {
            input_file,
            reference,
            tuning,
            output,
        } => commands::scan::run(&input_file, &reference, &tuning, &output).map(|_| true),
        Commands::Validate {
            input_file,
            reference,
            tuning,
            confirm,
            reject,
            accept_top,
            no_dg,
            user,
            audit,
            output,
        } => commands::validate::run(commands::validate::ValidateArgs {
            input_file,
            reference,
            tuning,
            confirm,
            reject,
            accept_top,
            no_dg,
            user,
            audit,
            output,
        }),
        Commands::Compat {
            un_numbers,
            reference,
            output,
        } => commands::compat::run(&un_numbers, &reference, &output).map(|_| true),
        Commands::Catalog { action } => match action {
            CatalogAction::List { preset } => commands::catalog::list(preset.as_deref()),
            CatalogAction::Show {
                un_number,
                reference,
            } => commands::catalog::show(&un_number, &reference),
            CatalogAction::Search { term, reference } => {
                commands::catalog::search(&term, &reference)
            }
            CatalogAction::Validate { file } => commands::catalog::validate(&file),
        }
        .map(|_| true),
        Commands::Rules { action } => match action {
            RulesAction::List => commands::rules::list(),
            RulesAction::Explain { preset } => commands::rules::explain(&preset),
            RulesAction::Validate { file } => commands::rules::validate(&file),
        }
        .map(|_| true),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
