//! JSON Lines (JSONL) output handler

use crate::output::OutputHandler;
use crate::types::ComplianceVerdict;
use std::io::{self, Write};
use std::sync::Mutex;

/// JSON Lines output handler
///
/// Outputs one verdict object per line (JSONL/NDJSON format)
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonOutput {
    /// Create a new JsonOutput that writes to stdout
    pub fn new() -> Self {
        Self::to_writer(Box::new(io::stdout()))
    }

    pub fn to_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputHandler for JsonOutput {
    fn emit_verdict(&self, verdict: &ComplianceVerdict) -> anyhow::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| anyhow::anyhow!("JSON output writer poisoned"))?;

        let json = serde_json::to_string(verdict)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        Ok(())
    }
}
