#![forbid(unsafe_code)]

mod backup;
mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::rollback::RollbackArgs;
use cmd::run::RunKind;
use jobtrail_core::config::{self, EffectiveConfig};
use jobtrail_core::db::SqliteStore;
use jobtrail_core::error::{EngineError, ErrorCode};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "jt: migrate job-application records to the current schema",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Record store path (overrides JOBTRAIL_DB and config).
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Run pending migrations, then validate",
        after_help = "EXAMPLES:\n    # Apply everything not yet in the ledger\n    jt run"
    )]
    Run,

    #[command(
        about = "Re-run every migration regardless of the ledger, then validate",
        after_help = "EXAMPLES:\n    # Re-apply all units; each one tolerates re-application\n    jt force"
    )]
    Force,

    #[command(
        about = "Simulate every migration without writing anything",
        after_help = "EXAMPLES:\n    # Preview changes as JSON\n    jt dry-run --json"
    )]
    DryRun,

    #[command(
        about = "Roll back one migration and remove its ledger entry",
        after_help = "EXAMPLES:\n    # Remove backfilled lifecycle events\n    jt rollback 006"
    )]
    Rollback(RollbackArgs),

    #[command(about = "Report record shapes and status-date coverage")]
    Validate,

    #[command(about = "List migrations and whether each has been applied")]
    Status,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("JOBTRAIL_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "jobtrail=debug,info"
        } else {
            "jobtrail=info,warn"
        })
    });

    let format = env::var("JOBTRAIL_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Config resolution fails either on the file itself or on locating the store.
fn config_error(err: &anyhow::Error) -> CliError {
    if err.downcast_ref::<EngineError>().is_some() {
        CliError::from_anyhow(err)
    } else {
        CliError::with_code(format!("{err:#}"), ErrorCode::ConfigParseError)
    }
}

fn dispatch(command: &Commands, config: &EffectiveConfig, output: OutputMode) -> anyhow::Result<()> {
    let store = SqliteStore::open(&config.store_path)?;
    info!(store = %config.store_path.display(), "record store connected");

    let result = match command {
        Commands::Run => cmd::run::run_migrations(RunKind::Pending, &store, config, output),
        Commands::Force => cmd::run::run_migrations(RunKind::Force, &store, config, output),
        Commands::DryRun => cmd::run::run_migrations(RunKind::DryRun, &store, config, output),
        Commands::Rollback(args) => cmd::rollback::run_rollback(args, &store, config, output),
        Commands::Validate => cmd::validate::run_validate(&store, config, output),
        Commands::Status => cmd::status::run_status(&store, output),
    };

    store.close()?;
    result
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = match config::resolve_config(&project_root, cli.db.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let output = resolve_output_mode(cli.json, None);
            let error = config_error(&err);
            if render_error(output, &error).is_err() {
                eprintln!("error: {err:#}");
            }
            return ExitCode::FAILURE;
        }
    };
    let output = resolve_output_mode(cli.json, config.project.output.as_deref());

    match dispatch(&cli.command, &config, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if render_error(output, &CliError::from_anyhow(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
