//! CLI command definitions and handlers.

pub mod analytics;
pub mod models;
pub mod predict;
pub mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sleepwatch_adapters::{model_paths, SqliteOutcomeStore};
use sleepwatch_core::inference::{load_vision_models, DevicePreference};
use sleepwatch_core::{PipelineError, VisionModels};
use tracing::info;

use crate::config::AppConfig;

/// Sleepwatch - sleep-state inference from camera frames
#[derive(Parser)]
#[command(name = "sleepwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve(serve::ServeArgs),
    /// Assess a single image file
    Predict(predict::PredictArgs),
    /// Print daily sleep analytics
    Analytics(analytics::AnalyticsArgs),
    /// Manage ML models
    Models(models::ModelsArgs),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Flags shared by every subcommand. They override config file values.
#[derive(Args, Clone, Default)]
pub struct GlobalArgs {
    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR", global = true)]
    pub models_dir: Option<PathBuf>,

    /// SQLite database path (overrides default and config)
    #[arg(long, value_name = "FILE", global = true)]
    pub database: Option<PathBuf>,

    /// Run inference on the CPU even when an accelerator is available
    #[arg(long, global = true)]
    pub cpu: bool,
}

impl GlobalArgs {
    /// Applies the flags on top of `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        if self.models_dir.is_some() {
            config.models.dir.clone_from(&self.models_dir);
        }
        if self.database.is_some() {
            config.storage.database.clone_from(&self.database);
        }
        if self.cpu {
            config.models.device = Some(DevicePreference::Cpu);
        }
    }
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed.
    Success = 0,
    /// The input was rejected (unsupported type, no face).
    Rejected = 1,
    /// Anything else went wrong.
    Error = 2,
}

impl ExitCode {
    /// Exit code for a pipeline failure.
    #[must_use]
    pub const fn for_pipeline_error(error: &PipelineError) -> Self {
        if error.is_client_error() {
            Self::Rejected
        } else {
            Self::Error
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

/// Loads the four models from the configured directory.
fn load_models(config: &AppConfig) -> Result<VisionModels> {
    let paths = model_paths();
    let missing = paths.missing();
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|p| p.display().to_string()).collect();
        bail!(
            "Missing model files: {}. Run `sleepwatch models fetch` first.",
            names.join(", ")
        );
    }
    load_vision_models(&paths, &config.model_settings()).context("Failed to load models")
}

/// Opens the configured outcome store.
fn open_store(config: &AppConfig) -> Result<Arc<SqliteOutcomeStore>> {
    let path = config.database_path();
    info!("Using database {}", path.display());
    Ok(Arc::new(SqliteOutcomeStore::open(path)?))
}
