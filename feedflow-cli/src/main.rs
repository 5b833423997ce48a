//! Feedflow: command line entry points for the feed pipeline.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feedflow::config::PipelineConfig;
use feedflow::errors::FeedflowError;
use feedflow::events::LoggingEventSink;
use feedflow::pipeline;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "feedflow")]
#[command(about = "Fetch, split and process XML product feeds through staged directories")]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to ./feedflow.toml when present)
    #[arg(short, long, env = "FEEDFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Override STORAGE_ROOT
    #[arg(long)]
    storage_root: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Fetch the configured feeds and split them into items
    Fetch,
    /// Transform one batch of pending items into the result container
    Process,
    /// Show per-stage file counts
    Status,
    /// Print the result container as JSON
    Results,
}

impl Command {
    const fn label(self) -> &'static str {
        match self {
            Self::Fetch => "Fetch",
            Self::Process => "Process",
            Self::Status => "Status",
            Self::Results => "Results",
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(root) = &cli.storage_root {
        config.storage_root.clone_from(root);
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<String> {
    let config = load_config(cli)?;
    info!(
        command = cli.command.label(),
        storage_root = %config.storage_root.display(),
        "Starting"
    );
    let pipeline = pipeline::open(config)?.with_event_sink(Arc::new(LoggingEventSink::debug()));

    match cli.command {
        Command::Fetch => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("starting async runtime")?;
            runtime.block_on(pipeline.fetch())?;
            pipeline.split()?;
            Ok("Fetch: Ok".to_string())
        }
        Command::Process => {
            pipeline.process()?;
            Ok("Process: Ok".to_string())
        }
        Command::Status => Ok(serde_json::to_string_pretty(&pipeline.status()?)?),
        Command::Results => Ok(serde_json::to_string_pretty(&pipeline.results()?)?),
    }
}

/// 2 for an unrecoverable results state, 1 for any other failure.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<FeedflowError>() {
        Some(e) if e.is_fatal() => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(command = cli.command.label(), error = %format!("{err:#}"), "Command failed");
            println!("{}: {err:#}", cli.command.label());
            exit_code(&err)
        }
    }
}
