//! CSV output handler

use crate::output::OutputHandler;
use crate::types::ComplianceVerdict;
use std::io::{self, Write};
use std::sync::Mutex;

const HEADER: [&str; 8] = [
    "domain",
    "status",
    "valid_certs",
    "ct_logs",
    "newest_cert_date",
    "issuer",
    "message",
    "failed_sources",
];

/// CSV output handler, one row per verdict
pub struct CsvOutput {
    writer: Mutex<csv::Writer<Box<dyn Write + Send>>>,
    header_written: Mutex<bool>,
}

impl CsvOutput {
    /// Create a new CsvOutput that writes to stdout
    pub fn new() -> Self {
        Self::to_writer(Box::new(io::stdout()))
    }

    pub fn to_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(csv::Writer::from_writer(writer)),
            header_written: Mutex::new(false),
        }
    }
}

impl Default for CsvOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputHandler for CsvOutput {
    fn emit_verdict(&self, verdict: &ComplianceVerdict) -> anyhow::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("CSV output writer poisoned"))?;
        let mut header_written = self
            .header_written
            .lock()
            .map_err(|_| anyhow::anyhow!("CSV header flag poisoned"))?;

        if !*header_written {
            writer.write_record(HEADER)?;
            *header_written = true;
        }

        let valid_certs = verdict.valid_certs.to_string();
        let ct_logs = verdict.ct_logs.to_string();
        let failed_sources = verdict.failed_sources.join(";");

        writer.write_record([
            verdict.domain.as_str(),
            verdict.status.as_str(),
            valid_certs.as_str(),
            ct_logs.as_str(),
            verdict.newest_cert_date.as_deref().unwrap_or(""),
            verdict.issuer.as_deref().unwrap_or(""),
            verdict.message.as_str(),
            failed_sources.as_str(),
        ])?;
        writer.flush()?;

        Ok(())
    }
}
