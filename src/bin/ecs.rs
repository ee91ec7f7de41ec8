// src/bin/ecs.rs
//! Column encryption sweep: one pass per invocation, driven by cron/systemd

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use encrypted_column_sweep::{CheckpointStore, Config, Pipeline, TableOutcome};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "ecs",
    version,
    about = "Incrementally encrypt sensitive columns in place"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML config (default: $ECS_CONFIG or dev-config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full pass over every configured table
    Run,
    /// Encrypt a single value with the configured key
    Encrypt { value: String },
    /// Decrypt a single value with the configured key
    Decrypt { value: String },
    /// Print pending checkpoints as JSON
    Status,
    /// Drop a table's checkpoint so the next run starts from the beginning
    Reset { table: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    match cli.command {
        Commands::Run => {
            let mut pipeline =
                Pipeline::from_config(&config).context("failed to initialise pipeline")?;
            let report = pipeline.run();
            for table in &report.tables {
                match &table.outcome {
                    TableOutcome::Completed => info!(
                        table = %table.table,
                        rows = table.rows_scanned,
                        updated = table.rows_updated,
                        "completed"
                    ),
                    TableOutcome::Aborted { reason } => warn!(
                        table = %table.table,
                        checkpoint = %table.final_checkpoint,
                        reason = %reason,
                        "aborted"
                    ),
                }
            }
        }
        Commands::Encrypt { value } => {
            let cipher = config.cipher()?;
            println!("{}", cipher.encrypt(&value)?);
        }
        Commands::Decrypt { value } => {
            let cipher = config.cipher()?;
            println!(
                "{}",
                cipher.decrypt(&value).context("value could not be decrypted")?
            );
        }
        Commands::Status => {
            let store = CheckpointStore::open(&config.paths.checkpoint_file)
                .context("failed to open checkpoint file")?;
            println!("{}", store.export_json()?);
        }
        Commands::Reset { table } => {
            let store = CheckpointStore::open(&config.paths.checkpoint_file)
                .context("failed to open checkpoint file")?;
            store.clear(&table)?;
            info!(table = %table, "checkpoint cleared");
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise the `--log-level` flag
fn init_logging(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
