use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::health::SourceHealthTracker;
use super::LogSource;
use crate::types::CertificateRecord;

/// Records gathered for one domain across all sources
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub records: Vec<CertificateRecord>,
    /// Sources that errored or were skipped for this domain
    pub failed_sources: Vec<String>,
}

impl FetchOutcome {
    /// True when every source failed, so the empty record set is not evidence
    pub fn all_failed(&self, source_count: usize) -> bool {
        source_count > 0 && self.failed_sources.len() == source_count
    }
}

/// Polls every configured source for a domain and merges the results.
///
/// Never fails: a source that errors contributes nothing and is named in
/// `FetchOutcome::failed_sources`.
pub struct LogFetcher {
    sources: Vec<Arc<dyn LogSource>>,
    health: Arc<SourceHealthTracker>,
    max_retries: u32,
    initial_backoff: Duration,
}

impl LogFetcher {
    pub fn new(sources: Vec<Arc<dyn LogSource>>, health: Arc<SourceHealthTracker>) -> Self {
        Self {
            sources,
            health,
            max_retries: 1,
            initial_backoff: Duration::from_secs(1),
        }
    }

    /// Attempts per source and domain (1 disables retries)
    pub fn with_retries(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn health(&self) -> &Arc<SourceHealthTracker> {
        &self.health
    }

    pub async fn fetch(&self, domain: &str) -> FetchOutcome {
        let results = join_all(
            self.sources
                .iter()
                .map(|source| self.fetch_from(source.as_ref(), domain)),
        )
        .await;

        let mut outcome = FetchOutcome::default();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Some(records) => outcome.records.extend(records),
                None => outcome.failed_sources.push(source.name().to_string()),
            }
        }

        debug!(
            "Fetched {} records for {} ({} failed sources)",
            outcome.records.len(),
            domain,
            outcome.failed_sources.len()
        );

        outcome
    }

    /// Query one source with retries; `None` if it failed or was skipped
    async fn fetch_from(&self, source: &dyn LogSource, domain: &str) -> Option<Vec<CertificateRecord>> {
        let name = source.name();

        if !self.health.should_poll(name).await {
            debug!("Skipping failed source {} for {}", name, domain);
            return None;
        }

        let mut attempt = 0;
        let mut backoff = self.initial_backoff;

        loop {
            attempt += 1;

            match source.fetch(domain).await {
                Ok(records) => {
                    self.health.record_success(name).await;
                    return Some(records);
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        warn!("Error: {} lookup failed for {}: {:#}", name, domain, e);
                        self.health.record_failure(name, format!("{:#}", e)).await;
                        return None;
                    }

                    warn!(
                        "Error querying {} for {} (attempt {}/{}): {:#}. Retrying in {:?}",
                        name, domain, attempt, self.max_retries, e, backoff
                    );

                    tokio::time::sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, Duration::from_secs(60));
                }
            }
        }
    }
}
