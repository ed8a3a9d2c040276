//! Analytics command - print daily summaries from the outcome store.

use anyhow::Result;
use clap::Args;
use sleepwatch_core::pipeline::Analytics;
use sleepwatch_core::AnalyticsReport;

use super::open_store;
use crate::config::AppConfig;
use crate::output::JsonOutput;

/// Arguments for the analytics command
#[derive(Args, Clone)]
pub struct AnalyticsArgs {
    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Run the analytics command.
pub fn run(args: &AnalyticsArgs, config: &AppConfig) -> Result<()> {
    let analytics = Analytics::new(open_store(config)?);
    let report = AnalyticsReport::from(analytics.summarize()?);
    JsonOutput::stdout(args.pretty).write(&report)
}
