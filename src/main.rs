//! # tagcast
//!
//! Command-line driver for weekly tag-count preprocessing and forecasting.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tagcast::config::PipelineConfig;
use tagcast::ingest::CsvSource;
use tagcast::pipeline;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tagcast")]
#[command(about = "Weekly tag activity forecasting", long_about = None)]
struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resample raw counts and write one (ds, y) file per tag
    Preprocess,

    /// Preprocess, then evaluate and forecast every tag
    Run,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match execute(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "tagcast failed");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> tagcast::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => {
            let config = PipelineConfig::default();
            config.validate()?;
            config
        }
    };
    let source = CsvSource::new(&config.input).with_count_column(&config.count_column);

    match cli.command {
        Commands::Preprocess => {
            let summary = pipeline::preprocess(&config, &source)?;
            info!(files = summary.files.len(), "processed series written");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run => {
            let forecaster = config.forecaster();
            let report = pipeline::run(&config, &source, forecaster.as_ref())?;
            info!(
                forecast = report.succeeded.len(),
                failed = report.failed.len(),
                metrics = %report.metrics_path.display(),
                "run finished"
            );
            // Per-tag failures are reported, not fatal, unless nothing succeeded.
            if report.succeeded.is_empty() && !report.failed.is_empty() {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
