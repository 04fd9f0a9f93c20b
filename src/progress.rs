//! Progress indicator using indicatif

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bar over the domains of a run (drawn on stderr)
pub struct ProgressIndicator {
    bar: Option<ProgressBar>,
}

impl ProgressIndicator {
    pub fn new(enabled: bool, total: usize) -> Self {
        if !enabled {
            return Self { bar: None };
        }

        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar: Some(bar) }
    }

    /// Advance by one finished domain
    pub fn inc(&self, domain: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(domain.to_string());
            bar.inc(1);
        }
    }

    /// Temporarily hide the bar to print other output
    pub fn suspend<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if let Some(ref bar) = self.bar {
            bar.suspend(f)
        } else {
            f()
        }
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.bar.is_some()
    }
}
