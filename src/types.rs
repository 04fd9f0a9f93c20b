use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Timestamp layout used by CT aggregators for `not_before` / `not_after`
pub const CT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A single certificate observation as reported by a CT-log source.
///
/// Fields are kept as reported; timestamps are parsed lazily by the analyzer
/// so a malformed value only disqualifies its own record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub not_before: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub not_after: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub issuer_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub ct_log: Option<String>,
}

impl CertificateRecord {
    pub fn new(not_before: &str, not_after: &str) -> Self {
        Self {
            not_before: Some(not_before.to_string()),
            not_after: Some(not_after.to_string()),
            issuer_name: None,
            ct_log: None,
        }
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.issuer_name = Some(issuer.to_string());
        self
    }

    pub fn with_ct_log(mut self, ct_log: &str) -> Self {
        self.ct_log = Some(ct_log.to_string());
        self
    }
}

/// Accept any JSON value, keeping only strings.
///
/// Upstream aggregators are not strict about types; a number or object where a
/// string is expected must not poison the rest of the response.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Compliance classification, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Warning,
    Error,
}

impl Status {
    /// Integer severity, also used as the process exit code
    pub fn severity(self) -> u8 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Error => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Error => "ERROR",
        }
    }

    /// Status symbol used in summaries
    pub fn symbol(self) -> &'static str {
        match self {
            Status::Ok => "✓",
            Status::Warning => "⚠",
            Status::Error => "✗",
        }
    }

    /// Overall severity of a batch: the worst status, `Ok` when empty
    pub fn overall<'a, I>(verdicts: I) -> Status
    where
        I: IntoIterator<Item = &'a ComplianceVerdict>,
    {
        verdicts
            .into_iter()
            .map(|v| v.status)
            .max()
            .unwrap_or(Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-domain compliance verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceVerdict {
    pub domain: String,

    /// Records satisfying the freshness policy
    pub valid_certs: usize,

    /// Distinct non-empty CT log identifiers among qualifying records
    pub ct_logs: usize,

    /// `not_before` date (YYYY-MM-DD) of the newest qualifying record
    pub newest_cert_date: Option<String>,

    /// Issuer of the newest qualifying record
    pub issuer: Option<String>,

    pub status: Status,

    pub message: String,

    /// Sources that failed to answer for this domain
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_sources: Vec<String>,
}

impl fmt::Display for ComplianceVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status.symbol(), self.domain, self.message)
    }
}

/// Report written once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// RFC 3339 creation time
    pub timestamp: String,
    pub domains: Vec<String>,
    pub results: Vec<ComplianceVerdict>,
}

impl RunReport {
    pub fn new(domains: Vec<String>, results: Vec<ComplianceVerdict>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            domains,
            results,
        }
    }

    pub fn overall_status(&self) -> Status {
        Status::overall(&self.results)
    }
}
