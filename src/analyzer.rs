//! Freshness policy and compliance classification for one domain

use chrono::NaiveDateTime;
use std::collections::HashSet;
use tracing::debug;

use crate::types::{CertificateRecord, ComplianceVerdict, Status, CT_TIMESTAMP_FORMAT};

pub const DEFAULT_MIN_LOGS: usize = 2;
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// Compliance policy applied to every domain in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Distinct CT logs required for `OK`
    pub min_logs: usize,
    /// Maximum age of a certificate, in whole days since `not_before`
    pub max_age_days: i64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            min_logs: DEFAULT_MIN_LOGS,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
        }
    }
}

/// Turns raw certificate observations into a `ComplianceVerdict`.
///
/// Pure: no I/O, and the caller supplies `now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateAnalyzer {
    policy: Policy,
}

/// A record that passed the freshness window
struct Qualified<'a> {
    record: &'a CertificateRecord,
    not_before: NaiveDateTime,
}

impl CertificateAnalyzer {
    pub fn new(policy: Policy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn analyze(
        &self,
        domain: &str,
        records: &[CertificateRecord],
        now: NaiveDateTime,
    ) -> ComplianceVerdict {
        if records.is_empty() {
            return empty_verdict(domain, Status::Error, "No certificates found".to_string());
        }

        let qualified: Vec<Qualified<'_>> = records
            .iter()
            .filter_map(|record| qualify(record, now, self.policy.max_age_days))
            .collect();

        if qualified.is_empty() {
            return empty_verdict(
                domain,
                Status::Warning,
                format!(
                    "No certificates found that are less than {} days old",
                    self.policy.max_age_days
                ),
            );
        }

        // Strictly greater, so the first of equal timestamps wins
        let mut newest = &qualified[0];
        for q in &qualified[1..] {
            if q.not_before > newest.not_before {
                newest = q;
            }
        }

        let ct_logs = qualified
            .iter()
            .filter_map(|q| q.record.ct_log.as_deref())
            .filter(|log| !log.is_empty())
            .collect::<HashSet<_>>()
            .len();

        let (status, message) = if ct_logs >= self.policy.min_logs {
            (Status::Ok, format!("Certificate found in {} CT logs", ct_logs))
        } else {
            (
                Status::Warning,
                format!(
                    "Certificate only found in {} CT logs (minimum recommended: {})",
                    ct_logs, self.policy.min_logs
                ),
            )
        };

        let verdict = ComplianceVerdict {
            domain: domain.to_string(),
            valid_certs: qualified.len(),
            ct_logs,
            newest_cert_date: Some(newest.not_before.format("%Y-%m-%d").to_string()),
            issuer: newest.record.issuer_name.clone(),
            status,
            message,
            failed_sources: Vec::new(),
        };

        debug!(
            "Domain: {} | valid certificates: {} | CT logs: {} | newest: {} | issuer: {}",
            verdict.domain,
            verdict.valid_certs,
            verdict.ct_logs,
            newest.not_before,
            verdict.issuer.as_deref().unwrap_or("Unknown")
        );

        verdict
    }
}

/// Check the freshness window; malformed or missing timestamps disqualify.
fn qualify(
    record: &CertificateRecord,
    now: NaiveDateTime,
    max_age_days: i64,
) -> Option<Qualified<'_>> {
    let not_before = parse_timestamp(record.not_before.as_deref()?)?;
    let not_after = parse_timestamp(record.not_after.as_deref()?)?;

    if not_before > now || now > not_after {
        return None;
    }

    // Age counts whole days only
    let age_days = (now - not_before).num_days();
    if age_days > max_age_days {
        return None;
    }

    Some(Qualified { record, not_before })
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, CT_TIMESTAMP_FORMAT).ok()
}

fn empty_verdict(domain: &str, status: Status, message: String) -> ComplianceVerdict {
    ComplianceVerdict {
        domain: domain.to_string(),
        valid_certs: 0,
        ct_logs: 0,
        newest_cert_date: None,
        issuer: None,
        status,
        message,
        failed_sources: Vec::new(),
    }
}
