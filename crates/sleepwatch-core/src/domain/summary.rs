//! Daily analytics rollups.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of most recent distinct dates an analytics query returns.
pub const ANALYTICS_WINDOW_DAYS: usize = 30;

/// Aggregate of all outcomes recorded on one UTC calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySummary {
    /// Calendar date, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Outcomes recorded that day.
    pub total_predictions: u64,
    /// Outcomes with closed eyes.
    pub closed_count: u64,
    /// Outcomes with open eyes.
    pub open_count: u64,
    /// Outcomes with confirmed sleep.
    pub sleep_confirmed_count: u64,
}

/// JSON body of the analytics endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalyticsReport {
    /// Summaries, newest date first.
    pub analytics: Vec<DailySummary>,
}

impl From<Vec<DailySummary>> for AnalyticsReport {
    fn from(analytics: Vec<DailySummary>) -> Self {
        Self { analytics }
    }
}
