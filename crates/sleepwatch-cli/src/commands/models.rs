//! Models command - manage ML models.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use sleepwatch_adapters::models::{
    fetch_models as adapter_fetch_models, list_models as adapter_list_models, models_dir,
    FetchOptions, MODELS,
};

use crate::config::AppConfig;
use crate::output::DownloadProgress;

/// Arguments for the models command
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Models subcommands
#[derive(Subcommand)]
pub enum ModelsCommand {
    /// Download required models
    Fetch {
        /// URL prefix to download from (overrides config)
        #[arg(long)]
        base_url: Option<String>,

        /// Re-download models that are already installed
        #[arg(long)]
        force: bool,
    },
    /// List installed models
    List,
    /// Print model directory path
    Path,
}

/// Run the models command.
pub fn run(args: &ModelsArgs, config: &AppConfig) -> Result<()> {
    match &args.command {
        ModelsCommand::Fetch { base_url, force } => {
            fetch_models(base_url.as_deref(), *force, config)
        }
        ModelsCommand::List => {
            list_models();
            Ok(())
        }
        ModelsCommand::Path => {
            println!("{}", models_dir().display());
            Ok(())
        }
    }
}

fn fetch_models(base_url: Option<&str>, force: bool, config: &AppConfig) -> Result<()> {
    let base_url = base_url
        .or(config.models.base_url.as_deref())
        .map(str::to_string)
        .context(
            "No model download URL configured. Set [models] base_url in the config \
             or pass --base-url.",
        )?;

    let mut checksums: Vec<(String, String)> = config
        .models
        .checksums
        .iter()
        .map(|(name, sum)| (name.clone(), sum.clone()))
        .collect();
    checksums.sort();

    let options = FetchOptions {
        base_url,
        force,
        checksums,
    };

    let progress = DownloadProgress::new()?;
    let fetched = adapter_fetch_models(&options, Some(&progress.callback()))?;

    if fetched.is_empty() {
        progress.finish("All models already installed");
    } else {
        progress.finish(&format!("Downloaded {}", fetched.join(", ")));
    }
    Ok(())
}

fn list_models() {
    let models = adapter_list_models();
    let dir = models_dir();

    println!("Models directory: {}", dir.display());
    println!();

    for (info, installed) in &models {
        let status = if *installed { "✓" } else { "✗" };
        println!(
            "  {status} {} ({}) - {}",
            info.name, info.filename, info.description
        );
    }

    println!();
    let installed_count = models.iter().filter(|(_, installed)| *installed).count();
    println!("{}/{} models installed", installed_count, MODELS.len());
}
