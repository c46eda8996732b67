//! Vidgate CLI: runs the ingestion handler for one media class.
//!
//! Storage and class policies come from the environment (see `IngestConfig`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use vidgate_cli::{check_file, print_json, read_event};
use vidgate_core::{IngestConfig, MediaClass};
use vidgate_infra::{init_telemetry, shutdown_telemetry, LogFormat};
use vidgate_processing::IngestionHandler;
use vidgate_storage::create_storage;

#[derive(Parser)]
#[command(name = "vidgate", about = "Validate uploaded media objects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate every object of an upload notification
    Handle {
        /// Media class: image, preview-video, full-video
        #[arg(long)]
        class: MediaClass,
        /// Notification JSON file ("-" or omitted reads stdin)
        #[arg(long)]
        event: Option<PathBuf>,
    },
    /// Check a local file against a class policy
    Check {
        /// Media class: image, preview-video, full-video
        #[arg(long)]
        class: MediaClass,
        /// Path to the file to check
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = IngestConfig::from_env().context("Failed to load configuration")?;
    init_telemetry("vidgate", LogFormat::from_setting(Some(&config.log_format)))
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    let result = run(cli.command, config).await;
    shutdown_telemetry().await;
    result
}

async fn run(command: Commands, config: IngestConfig) -> anyhow::Result<()> {
    match command {
        Commands::Handle { class, event } => {
            config.validate().context("Invalid configuration")?;

            let event = read_event(event.as_deref()).await?;
            let storage = create_storage(&config.storage)
                .await
                .context("Failed to create storage backend")?;

            tracing::info!(
                class = %class,
                backend = %storage.backend_type(),
                records = event.len(),
                "Handling upload event"
            );

            let policy = config.class_config(class).clone();
            let handler = IngestionHandler::new(class, policy, Arc::clone(&storage));
            let response = handler.handle(&event).await?;
            print_json(&response)?;
        }
        Commands::Check { class, file } => {
            let report = check_file(&file, class, config.class_config(class).clone()).await?;
            print_json(&report)?;
        }
    }

    Ok(())
}
