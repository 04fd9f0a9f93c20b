//! Run statistics for ct-compliance

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::types::Status;

/// Thread-safe per-run counters
#[derive(Clone)]
pub struct RunStats {
    domains_checked: Arc<AtomicU64>,
    records_fetched: Arc<AtomicU64>,
    source_failures: Arc<AtomicU64>,
    ok: Arc<AtomicU64>,
    warnings: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
    start_time: Instant,
}

/// Snapshot of statistics at a point in time
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub domains_checked: u64,
    pub records_fetched: u64,
    pub source_failures: u64,
    pub ok: u64,
    pub warnings: u64,
    pub errors: u64,
    pub elapsed_secs: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            domains_checked: Arc::new(AtomicU64::new(0)),
            records_fetched: Arc::new(AtomicU64::new(0)),
            source_failures: Arc::new(AtomicU64::new(0)),
            ok: Arc::new(AtomicU64::new(0)),
            warnings: Arc::new(AtomicU64::new(0)),
            errors: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Count one domain's fetch
    pub fn record_fetch(&self, records: usize, failed_sources: usize) {
        self.records_fetched
            .fetch_add(records as u64, Ordering::Relaxed);
        self.source_failures
            .fetch_add(failed_sources as u64, Ordering::Relaxed);
    }

    /// Count one finished domain
    pub fn record_verdict(&self, status: Status) {
        self.domains_checked.fetch_add(1, Ordering::Relaxed);
        let counter = match status {
            Status::Ok => &self.ok,
            Status::Warning => &self.warnings,
            Status::Error => &self.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            domains_checked: self.domains_checked.load(Ordering::Relaxed),
            records_fetched: self.records_fetched.load(Ordering::Relaxed),
            source_failures: self.source_failures.load(Ordering::Relaxed),
            ok: self.ok.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            elapsed_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Format statistics as a human-readable string
    pub fn format_stats(&self) -> String {
        let s = self.snapshot();
        format!(
            "{} domains ({} ok, {} warning, {} error) | {} records | {} source failures | {}",
            s.domains_checked,
            s.ok,
            s.warnings,
            s.errors,
            s.records_fetched,
            s.source_failures,
            Self::format_elapsed(s.elapsed_secs)
        )
    }

    pub fn format_elapsed(secs: u64) -> String {
        let hours = secs / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
