//! Serve command - run the HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use sleepwatch_adapters::{serve, AppState};
use sleepwatch_core::SleepMonitor;
use tracing::info;

use super::{load_models, open_store};
use crate::config::AppConfig;

/// Arguments for the serve command
#[derive(Args, Clone, Default)]
pub struct ServeArgs {
    /// Bind address (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Allowed CORS origin; repeat for several (overrides config)
    #[arg(long = "cors-origin", value_name = "ORIGIN")]
    pub cors_origins: Vec<String>,
}

impl ServeArgs {
    /// Applies the flags on top of `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        if self.host.is_some() {
            config.server.host.clone_from(&self.host);
        }
        config.server.port = self.port.or(config.server.port);
        if !self.cors_origins.is_empty() {
            config.server.cors_origins = Some(self.cors_origins.clone());
        }
    }
}

/// Run the serve command. Blocks until Ctrl-C.
pub fn run(args: &ServeArgs, config: &AppConfig) -> Result<()> {
    let mut config = config.clone();
    args.apply(&mut config);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_address()))?;

    let models = load_models(&config)?;
    let store = open_store(&config)?;
    let monitor = SleepMonitor::new(models, config.pipeline_config(), store);
    let state = AppState::new(Arc::new(monitor), config.server_settings());

    info!("Models loaded, starting server");
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(serve(addr, state))
}
