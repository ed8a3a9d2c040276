//! Sleepwatch CLI - sleep-state inference service and tools.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::{Cli, Commands, ExitCode, LogFormat};
use config::AppConfig;

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let (text, json) = match cli.log_format {
        LogFormat::Text => (Some(fmt::layer().with_writer(std::io::stderr)), None),
        LogFormat::Json => (
            None,
            Some(fmt::layer().json().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(text)
        .with(json)
        .with(filter)
        .init();

    let mut config = AppConfig::load();
    cli.global.apply(&mut config);
    if let Some(ref dir) = config.models.dir {
        sleepwatch_adapters::models::set_models_dir(dir.clone());
    }

    let result = match cli.command {
        Commands::Serve(ref args) => commands::serve::run(args, &config).map(|()| ExitCode::Success),
        Commands::Predict(ref args) => commands::predict::run(args, &config),
        Commands::Analytics(ref args) => {
            commands::analytics::run(args, &config).map(|()| ExitCode::Success)
        }
        Commands::Models(ref args) => {
            commands::models::run(args, &config).map(|()| ExitCode::Success)
        }
    };

    let exit_code = result.unwrap_or_else(|e| {
        eprintln!("error: {e:#}");
        ExitCode::Error
    });

    exit_code.into()
}
