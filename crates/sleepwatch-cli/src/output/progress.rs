//! Download progress bar using indicatif.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use sleepwatch_adapters::models::ProgressCallback;

/// Progress bar shared across the model downloads.
pub struct DownloadProgress {
    bar: Arc<ProgressBar>,
    current_model: Arc<Mutex<String>>,
}

impl DownloadProgress {
    /// Creates the bar.
    ///
    /// # Errors
    ///
    /// Returns an error if the bar template is invalid.
    pub fn new() -> Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
                .map_err(|e| anyhow::anyhow!("Invalid progress template: {e}"))?
                .progress_chars("#>-"),
        );
        Ok(Self {
            bar: Arc::new(bar),
            current_model: Arc::new(Mutex::new(String::new())),
        })
    }

    /// Callback updating the bar; resets its length when a new model starts.
    #[must_use]
    pub fn callback(&self) -> ProgressCallback {
        let bar = Arc::clone(&self.bar);
        let current_model = Arc::clone(&self.current_model);

        Box::new(move |name: &str, downloaded: u64, total: Option<u64>| {
            let is_new_model = {
                let mut current = current_model.lock().unwrap_or_else(PoisonError::into_inner);
                if *current == name {
                    false
                } else {
                    *current = name.to_string();
                    true
                }
            };
            if is_new_model {
                bar.set_length(total.unwrap_or(downloaded));
                bar.set_message(name.to_string());
            }
            bar.set_position(downloaded);
        })
    }

    /// Finishes the bar with `message`.
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
