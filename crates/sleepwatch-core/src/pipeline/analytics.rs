//! Daily rollups over recorded outcomes.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::domain::{DailySummary, EyeState, SleepOutcome, ANALYTICS_WINDOW_DAYS};
use crate::ports::OutcomeStore;

/// Read-only analytics over an outcome store.
#[derive(Clone)]
pub struct Analytics {
    store: Arc<dyn OutcomeStore>,
}

impl Analytics {
    /// Creates an aggregator reading from `store`.
    #[must_use]
    pub fn new(store: Arc<dyn OutcomeStore>) -> Self {
        Self { store }
    }

    /// Summaries for the most recent 30 distinct dates, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn summarize(&self) -> Result<Vec<DailySummary>> {
        self.store
            .daily_summaries(ANALYTICS_WINDOW_DAYS)
            .context("Failed to fetch analytics data")
    }
}

impl std::fmt::Debug for Analytics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analytics").finish_non_exhaustive()
    }
}

/// Groups outcomes by UTC calendar date and returns the `limit` newest dates, newest first.
#[must_use]
pub fn summarize_by_day(outcomes: &[SleepOutcome], limit: usize) -> Vec<DailySummary> {
    let mut by_date: BTreeMap<chrono::NaiveDate, DailySummary> = BTreeMap::new();

    for outcome in outcomes {
        let date = outcome.recorded_at().date_naive();
        let summary = by_date.entry(date).or_insert_with(|| DailySummary {
            date,
            total_predictions: 0,
            closed_count: 0,
            open_count: 0,
            sleep_confirmed_count: 0,
        });

        summary.total_predictions += 1;
        match outcome.prediction() {
            EyeState::Closed => summary.closed_count += 1,
            EyeState::Open => summary.open_count += 1,
        }
        if outcome.sleep_confirmed() == Some(true) {
            summary.sleep_confirmed_count += 1;
        }
    }

    by_date.into_values().rev().take(limit).collect()
}
