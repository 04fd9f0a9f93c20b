use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::fetcher::LogFetcher;
use crate::analyzer::CertificateAnalyzer;
use crate::clock::Clock;
use crate::output::OutputManager;
use crate::progress::ProgressIndicator;
use crate::stats::RunStats;
use crate::types::{ComplianceVerdict, RunReport, Status};

/// Result of a full run: verdicts in input order and the overall severity
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub verdicts: Vec<ComplianceVerdict>,
    pub status: Status,
}

impl RunOutcome {
    /// Process exit code: 0 OK, 1 WARNING, 2 ERROR
    pub fn exit_code(&self) -> u8 {
        self.status.severity()
    }

    pub fn into_report(self, domains: Vec<String>) -> RunReport {
        RunReport::new(domains, self.verdicts)
    }
}

/// Runs fetch + analysis for every requested domain
pub struct RunCoordinator {
    fetcher: Arc<LogFetcher>,
    analyzer: CertificateAnalyzer,
    clock: Arc<dyn Clock>,
    max_concurrent: usize,
}

impl RunCoordinator {
    pub fn new(
        fetcher: Arc<LogFetcher>,
        analyzer: CertificateAnalyzer,
        clock: Arc<dyn Clock>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            fetcher,
            analyzer,
            clock,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Check a single domain
    pub async fn check_domain(&self, domain: &str, stats: &RunStats) -> ComplianceVerdict {
        debug!("Checking {}...", domain);

        let outcome = self.fetcher.fetch(domain).await;
        stats.record_fetch(outcome.records.len(), outcome.failed_sources.len());

        if outcome.all_failed(self.fetcher.source_count()) {
            warn!("No source answered for {}; treating as no certificates found", domain);
        }

        let mut verdict = self.analyzer.analyze(domain, &outcome.records, self.clock.now());
        verdict.failed_sources = outcome.failed_sources;
        verdict
    }

    /// Check every domain and emit verdicts to the outputs in input order.
    ///
    /// Up to `max_concurrent` domains are in flight at once; ordered buffering
    /// keeps verdicts aligned with `domains` whatever order fetches finish in.
    pub async fn run(
        &self,
        domains: &[String],
        output_manager: &OutputManager,
        stats: &RunStats,
        progress: &ProgressIndicator,
    ) -> RunOutcome {
        info!(
            "Checking {} domains for Certificate Transparency logs (min_logs={}, max_age_days={})",
            domains.len(),
            self.analyzer.policy().min_logs,
            self.analyzer.policy().max_age_days
        );

        let mut verdicts = Vec::with_capacity(domains.len());
        let mut status = Status::Ok;

        let mut results = stream::iter(domains)
            .map(|domain| self.check_domain(domain, stats))
            .buffered(self.max_concurrent);

        while let Some(verdict) = results.next().await {
            stats.record_verdict(verdict.status);
            status = status.max(verdict.status);

            if let Err(e) = progress.suspend(|| output_manager.emit(&verdict)) {
                warn!("Output error: {:?}", e);
            }

            progress.inc(&verdict.domain);
            verdicts.push(verdict);
        }

        progress.finish();

        if let Err(e) = output_manager.finish(&verdicts) {
            warn!("Output error: {:?}", e);
        }

        self.fetcher.health().log_summary().await;
        info!("Run complete: {}", stats.format_stats());

        RunOutcome { verdicts, status }
    }
}
