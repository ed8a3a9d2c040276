//! Outcome persistence port.

use crate::domain::{DailySummary, SleepOutcome};

/// Port for appending outcomes and reading daily rollups.
pub trait OutcomeStore: Send + Sync {
    /// Appends one outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn append(&self, outcome: &SleepOutcome) -> anyhow::Result<()>;

    /// Returns per-date summaries for the `limit` most recent dates, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    fn daily_summaries(&self, limit: usize) -> anyhow::Result<Vec<DailySummary>>;
}
