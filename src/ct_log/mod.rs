pub mod client;
pub mod coordinator;
pub mod fetcher;
pub mod health;

use async_trait::async_trait;

use crate::types::CertificateRecord;

pub use client::{CrtShSource, GoogleCtSource};
pub use coordinator::{RunCoordinator, RunOutcome};
pub use fetcher::{FetchOutcome, LogFetcher};
pub use health::{SourceHealth, SourceHealthTracker};

/// A CT-log aggregator that can list certificate observations for a domain
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Name used in logs, health tracking and `failed_sources`
    fn name(&self) -> &str;

    /// Query the source. Errors cover transport, HTTP status and decoding.
    async fn fetch(&self, domain: &str) -> anyhow::Result<Vec<CertificateRecord>>;
}
