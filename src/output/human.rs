//! Human-readable colored terminal output

use crate::output::OutputHandler;
use crate::types::{ComplianceVerdict, Status};
use colored::{ColoredString, Colorize};
use std::io::{self, Write};
use std::sync::Mutex;

/// Human-readable output handler with colored terminal output
pub struct HumanOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    use_colors: bool,
}

impl HumanOutput {
    /// Create a new HumanOutput that writes to stdout
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            use_colors: is_terminal::is_terminal(std::io::stdout()),
        }
    }

    /// Create a new HumanOutput that writes to a file or buffer
    pub fn to_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            use_colors: false, // No colors when not writing to a terminal
        }
    }

    fn paint(&self, status: Status, text: &str) -> ColoredString {
        if !self.use_colors {
            return text.normal();
        }

        match status {
            Status::Ok => text.green().bold(),
            Status::Warning => text.yellow().bold(),
            Status::Error => text.red().bold(),
        }
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Box<dyn Write + Send>>> {
        self.writer
            .lock()
            .map_err(|_| anyhow::anyhow!("human output writer poisoned"))
    }
}

impl Default for HumanOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputHandler for HumanOutput {
    fn emit_verdict(&self, verdict: &ComplianceVerdict) -> anyhow::Result<()> {
        let mut writer = self.lock()?;

        let label = format!("{}:", verdict.status);
        writeln!(
            writer,
            "{} {} {}",
            self.paint(verdict.status, &label),
            if self.use_colors {
                verdict.domain.cyan().to_string()
            } else {
                verdict.domain.clone()
            },
            verdict.message
        )?;

        if verdict.valid_certs > 0 {
            writeln!(
                writer,
                "    Newest certificate: {} ({})",
                verdict.newest_cert_date.as_deref().unwrap_or("-"),
                verdict.issuer.as_deref().unwrap_or("Unknown issuer")
            )?;
        }

        if !verdict.failed_sources.is_empty() {
            writeln!(
                writer,
                "    Unreachable sources: {}",
                verdict.failed_sources.join(", ")
            )?;
        }

        writer.flush()?;
        Ok(())
    }

    fn finish(&self, verdicts: &[ComplianceVerdict]) -> anyhow::Result<()> {
        let mut writer = self.lock()?;

        writeln!(writer)?;
        writeln!(writer, "Summary:")?;
        for verdict in verdicts {
            writeln!(
                writer,
                "{} {}: {}",
                self.paint(verdict.status, verdict.status.symbol()),
                verdict.domain,
                verdict.message
            )?;
        }

        writer.flush()?;
        Ok(())
    }
}
