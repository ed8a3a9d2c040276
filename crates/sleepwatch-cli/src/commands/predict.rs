//! Predict command - assess a single image file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sleepwatch_core::pipeline::{SleepMonitor, SleepPipeline};
use sleepwatch_core::{Frame, PipelineError, PredictionResponse};
use tracing::{debug, info};

use super::{load_models, open_store, ExitCode};
use crate::config::AppConfig;
use crate::output::JsonOutput;

/// Arguments for the predict command
#[derive(Args, Clone)]
pub struct PredictArgs {
    /// JPEG or PNG image to assess
    pub image: PathBuf,

    /// Store the verdict in the outcome database
    #[arg(long)]
    pub record: bool,

    /// Pixels added around the eye landmarks (overrides config)
    #[arg(long)]
    pub eye_margin: Option<u32>,

    /// Lying-down ratio (overrides config)
    #[arg(long, value_parser = parse_ratio)]
    pub lying_down_ratio: Option<f32>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Parse and validate a positive ratio.
fn parse_ratio(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("{value} is not a positive number"))
    }
}

impl PredictArgs {
    /// Applies the flags on top of `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        config.detection.eye_margin = self.eye_margin.or(config.detection.eye_margin);
        config.detection.lying_down_ratio =
            self.lying_down_ratio.or(config.detection.lying_down_ratio);
    }
}

/// Run the predict command.
///
/// Prints the prediction JSON on success. Rejected inputs print
/// `{"detail": ...}` and map to [`ExitCode::Rejected`].
pub fn run(args: &PredictArgs, config: &AppConfig) -> Result<ExitCode> {
    let mut config = config.clone();
    args.apply(&mut config);

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("Failed to read {}", args.image.display()))?;
    debug!("Read {} bytes from {}", bytes.len(), args.image.display());

    let output = JsonOutput::stdout(args.pretty);
    let frame = match Frame::decode(&bytes) {
        Ok(frame) => frame,
        Err(e) => return report_failure(&output, e),
    };

    let models = load_models(&config)?;
    let result = if args.record {
        let store = open_store(&config)?;
        SleepMonitor::new(models, config.pipeline_config(), store).observe(&frame)
    } else {
        SleepPipeline::new(models, config.pipeline_config()).assess(&frame)
    };

    match result {
        Ok(verdict) => {
            info!("{}: {}", args.image.display(), verdict.eye_state());
            output.write(&PredictionResponse::from(verdict))?;
            Ok(ExitCode::Success)
        }
        Err(e) => report_failure(&output, e),
    }
}

/// Rejections are printed as `{"detail": ...}`; other failures propagate.
fn report_failure(output: &JsonOutput, error: PipelineError) -> Result<ExitCode> {
    match ExitCode::for_pipeline_error(&error) {
        ExitCode::Rejected => {
            output.write_detail(&error.to_string())?;
            Ok(ExitCode::Rejected)
        }
        _ => match error {
            PipelineError::Inference(e) => Err(e),
            other => Err(other.into()),
        },
    }
}
