//! Spinner shown while a backend request is in flight

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner for one load step; disabled spinners draw nothing
pub struct LoadSpinner {
    start_time: Instant,
    bar: Option<ProgressBar>,
}

impl LoadSpinner {
    /// Start a spinner with `message`, or a silent tracker when `enabled` is false.
    pub fn start(message: impl Into<String>, enabled: bool) -> Self {
        let bar = enabled.then(|| {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                bar.set_style(style);
            }
            bar.set_message(message.into());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });

        Self {
            start_time: Instant::now(),
            bar,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Stop and clear the spinner
    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

impl Drop for LoadSpinner {
    fn drop(&mut self) {
        self.finish();
    }
}
