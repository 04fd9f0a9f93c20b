use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Health status of a CT-log source during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceHealth {
    /// Source is answering normally
    Healthy,
    /// Source has failed recently but is still queried
    Degraded,
    /// Source hit the failure threshold and is skipped for the rest of the run
    Failed,
}

/// Health information for a single source
#[derive(Debug, Clone)]
pub struct SourceHealthInfo {
    pub status: SourceHealth,
    /// Consecutive failures
    pub failure_count: u32,
    pub total_failures: u32,
    pub total_successes: u32,
    pub last_error: Option<String>,
}

impl SourceHealthInfo {
    fn new() -> Self {
        Self {
            status: SourceHealth::Healthy,
            failure_count: 0,
            total_failures: 0,
            total_successes: 0,
            last_error: None,
        }
    }
}

/// Tracks source health across the domains of one run.
///
/// A source that fails `failure_threshold` times in a row stops being queried,
/// so a dead aggregator costs one timeout per domain only until the breaker
/// trips. A threshold of 0 never trips.
pub struct SourceHealthTracker {
    health: RwLock<HashMap<String, SourceHealthInfo>>,
    failure_threshold: u32,
}

impl SourceHealthTracker {
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            health: RwLock::new(HashMap::new()),
            failure_threshold,
        }
    }

    pub async fn record_success(&self, source: &str) {
        let mut health = self.health.write().await;
        let info = health
            .entry(source.to_string())
            .or_insert_with(SourceHealthInfo::new);

        if info.status == SourceHealth::Degraded {
            debug!("Source recovered: {} is now healthy", source);
        }

        info.status = SourceHealth::Healthy;
        info.failure_count = 0;
        info.total_successes += 1;
    }

    pub async fn record_failure(&self, source: &str, error: String) {
        let mut health = self.health.write().await;
        let info = health
            .entry(source.to_string())
            .or_insert_with(SourceHealthInfo::new);

        info.failure_count += 1;
        info.total_failures += 1;
        info.last_error = Some(error.clone());

        let old_status = info.status;
        info.status = if self.failure_threshold > 0 && info.failure_count >= self.failure_threshold {
            SourceHealth::Failed
        } else {
            SourceHealth::Degraded
        };

        match (old_status, info.status) {
            (SourceHealth::Healthy, SourceHealth::Degraded) => {
                debug!("Source degraded: {} (failure {}): {}", source, info.failure_count, error);
            }
            (_, SourceHealth::Failed) if old_status != SourceHealth::Failed => {
                warn!(
                    "Source failed: {} after {} consecutive failures, skipping it for remaining domains: {}",
                    source, info.failure_count, error
                );
            }
            _ => {}
        }
    }

    /// Whether the source should still be queried
    pub async fn should_poll(&self, source: &str) -> bool {
        let health = self.health.read().await;
        health
            .get(source)
            .map(|info| info.status != SourceHealth::Failed)
            .unwrap_or(true)
    }

    pub async fn get_status(&self, source: &str) -> SourceHealth {
        let health = self.health.read().await;
        health
            .get(source)
            .map(|info| info.status)
            .unwrap_or(SourceHealth::Healthy)
    }

    pub async fn get_info(&self, source: &str) -> Option<SourceHealthInfo> {
        let health = self.health.read().await;
        health.get(source).cloned()
    }

    /// (healthy, degraded, failed) source counts
    pub async fn get_stats(&self) -> (usize, usize, usize) {
        let health = self.health.read().await;
        let mut healthy = 0;
        let mut degraded = 0;
        let mut failed = 0;

        for info in health.values() {
            match info.status {
                SourceHealth::Healthy => healthy += 1,
                SourceHealth::Degraded => degraded += 1,
                SourceHealth::Failed => failed += 1,
            }
        }

        (healthy, degraded, failed)
    }

    pub async fn log_summary(&self) {
        let (healthy, degraded, failed) = self.get_stats().await;
        let total = healthy + degraded + failed;

        if total == 0 {
            return;
        }

        info!(
            "Source health summary: {} total ({} healthy, {} degraded, {} failed)",
            total, healthy, degraded, failed
        );

        let health = self.health.read().await;
        for (name, info) in health.iter() {
            if info.total_failures > 0 {
                warn!(
                    "Source {}: {} failed / {} successful queries, last error: {}",
                    name,
                    info.total_failures,
                    info.total_successes,
                    info.last_error.as_deref().unwrap_or("unknown")
                );
            }
        }
    }
}

impl Default for SourceHealthTracker {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_tracker_success() {
        let tracker = SourceHealthTracker::new(3);

        assert_eq!(tracker.get_status("crt.sh").await, SourceHealth::Healthy);

        tracker.record_success("crt.sh").await;
        assert_eq!(tracker.get_status("crt.sh").await, SourceHealth::Healthy);

        let info = tracker.get_info("crt.sh").await.unwrap();
        assert_eq!(info.total_successes, 1);
    }

    #[tokio::test]
    async fn test_health_tracker_degraded_then_failed() {
        let tracker = SourceHealthTracker::new(3);

        tracker.record_failure("crt.sh", "Error 1".to_string()).await;
        assert_eq!(tracker.get_status("crt.sh").await, SourceHealth::Degraded);
        assert!(tracker.should_poll("crt.sh").await);

        tracker.record_failure("crt.sh", "Error 2".to_string()).await;
        assert_eq!(tracker.get_status("crt.sh").await, SourceHealth::Degraded);

        tracker.record_failure("crt.sh", "Error 3".to_string()).await;
        assert_eq!(tracker.get_status("crt.sh").await, SourceHealth::Failed);
        assert!(!tracker.should_poll("crt.sh").await);

        let info = tracker.get_info("crt.sh").await.unwrap();
        assert_eq!(info.last_error.as_deref(), Some("Error 3"));
    }

    #[tokio::test]
    async fn test_success_resets_consecutive_failures() {
        let tracker = SourceHealthTracker::new(2);

        tracker.record_failure("google", "Error".to_string()).await;
        tracker.record_success("google").await;
        tracker.record_failure("google", "Error".to_string()).await;

        assert_eq!(tracker.get_status("google").await, SourceHealth::Degraded);

        let info = tracker.get_info("google").await.unwrap();
        assert_eq!(info.failure_count, 1);
        assert_eq!(info.total_failures, 2);
    }

    #[tokio::test]
    async fn test_zero_threshold_never_trips() {
        let tracker = SourceHealthTracker::new(0);

        for _ in 0..10 {
            tracker.record_failure("crt.sh", "Error".to_string()).await;
        }

        assert!(tracker.should_poll("crt.sh").await);
    }

    #[tokio::test]
    async fn test_get_stats() {
        let tracker = SourceHealthTracker::new(2);

        tracker.record_success("a").await;
        tracker.record_failure("b", "Error".to_string()).await;
        tracker.record_failure("c", "Error 1".to_string()).await;
        tracker.record_failure("c", "Error 2".to_string()).await;

        assert_eq!(tracker.get_stats().await, (1, 1, 1));
    }
}
