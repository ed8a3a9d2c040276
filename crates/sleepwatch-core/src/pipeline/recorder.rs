//! Event recording.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::{SleepOutcome, SleepVerdict};
use crate::ports::OutcomeStore;

/// Appends verdicts to an outcome store, absorbing write failures.
#[derive(Clone)]
pub struct EventRecorder {
    store: Arc<dyn OutcomeStore>,
}

impl EventRecorder {
    /// Creates a recorder writing to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn OutcomeStore>) -> Self {
        Self { store }
    }

    /// Records `verdict` stamped with the current UTC time.
    ///
    /// Returns the stored outcome, or `None` if the write failed (logged at `warn`).
    pub fn record(&self, verdict: SleepVerdict) -> Option<SleepOutcome> {
        self.record_at(verdict, Utc::now())
    }

    /// Records `verdict` stamped with `at`.
    pub fn record_at(&self, verdict: SleepVerdict, at: DateTime<Utc>) -> Option<SleepOutcome> {
        let outcome = SleepOutcome::new(verdict, at);
        match self.store.append(&outcome) {
            Ok(()) => {
                debug!(
                    prediction = %outcome.prediction(),
                    sleep_confirmed = ?outcome.sleep_confirmed(),
                    "Recorded outcome"
                );
                Some(outcome)
            }
            Err(e) => {
                warn!("Failed to record outcome: {e:#}");
                None
            }
        }
    }
}

impl std::fmt::Debug for EventRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRecorder").finish_non_exhaustive()
    }
}
