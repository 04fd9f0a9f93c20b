//! Output handling for ct-compliance
//!
//! Verdicts are streamed to one or more handlers as they are produced; the
//! JSON run report is written separately by [`report`].

use crate::types::ComplianceVerdict;
use std::sync::Arc;

pub mod csv;
pub mod human;
pub mod json;
pub mod report;
pub mod silent;

/// Trait for handlers that render verdicts
pub trait OutputHandler: Send + Sync {
    /// Emit one domain's verdict
    fn emit_verdict(&self, verdict: &ComplianceVerdict) -> anyhow::Result<()>;

    /// Called once after the last verdict, with all verdicts in input order
    fn finish(&self, _verdicts: &[ComplianceVerdict]) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Manager that dispatches output to multiple handlers
pub struct OutputManager {
    handlers: Vec<Arc<dyn OutputHandler>>,
}

impl OutputManager {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn OutputHandler>) {
        self.handlers.push(handler);
    }

    /// Emit a verdict to all handlers
    ///
    /// Errors from individual handlers are logged; an error is returned only
    /// when the single configured handler fails.
    pub fn emit(&self, verdict: &ComplianceVerdict) -> anyhow::Result<()> {
        let mut last_error = None;

        for handler in &self.handlers {
            if let Err(e) = handler.emit_verdict(verdict) {
                tracing::warn!("Output handler error: {}", e);
                last_error = Some(e);
            }
        }

        if let Some(err) = last_error {
            if self.handlers.len() == 1 {
                return Err(err);
            }
        }

        Ok(())
    }

    /// Let every handler write its end-of-run output, with the same error
    /// handling as [`OutputManager::emit`]
    pub fn finish(&self, verdicts: &[ComplianceVerdict]) -> anyhow::Result<()> {
        let mut last_error = None;

        for handler in &self.handlers {
            if let Err(e) = handler.finish(verdicts) {
                tracing::warn!("Output handler error: {}", e);
                last_error = Some(e);
            }
        }

        if let Some(err) = last_error {
            if self.handlers.len() == 1 {
                return Err(err);
            }
        }

        Ok(())
    }
}

impl Default for OutputManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::Status;
    use std::io::{self, Write};
    use std::sync::Mutex;

    /// In-memory writer whose contents can be read back after the handler owns it
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    pub(crate) fn create_test_verdict(domain: &str, status: Status) -> ComplianceVerdict {
        ComplianceVerdict {
            domain: domain.to_string(),
            valid_certs: 2,
            ct_logs: 2,
            newest_cert_date: Some("2024-06-10".to_string()),
            issuer: Some("C=US, O=Let's Encrypt, CN=R3".to_string()),
            status,
            message: "Certificate found in 2 CT logs".to_string(),
            failed_sources: Vec::new(),
        }
    }

    struct FailingOutput;

    impl OutputHandler for FailingOutput {
        fn emit_verdict(&self, _verdict: &ComplianceVerdict) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }

        fn finish(&self, _verdicts: &[ComplianceVerdict]) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn test_output_manager_no_handlers() {
        let manager = OutputManager::new();
        let verdict = create_test_verdict("a.test", Status::Ok);

        assert!(manager.emit(&verdict).is_ok());
        assert!(manager.finish(&[verdict]).is_ok());
    }

    #[test]
    fn test_output_manager_with_handlers() {
        let mut manager = OutputManager::new();
        manager.add_handler(Arc::new(silent::SilentOutput));

        let verdict = create_test_verdict("a.test", Status::Ok);
        assert!(manager.emit(&verdict).is_ok());
    }

    #[test]
    fn test_single_failing_handler_reports_error() {
        let mut manager = OutputManager::new();
        manager.add_handler(Arc::new(FailingOutput));

        let verdict = create_test_verdict("a.test", Status::Ok);
        assert!(manager.emit(&verdict).is_err());
    }

    #[test]
    fn test_failing_handler_does_not_stop_others() {
        let buffer = SharedBuffer::default();
        let mut manager = OutputManager::new();
        manager.add_handler(Arc::new(FailingOutput));
        manager.add_handler(Arc::new(json::JsonOutput::to_writer(Box::new(buffer.clone()))));

        let verdict = create_test_verdict("a.test", Status::Ok);
        assert!(manager.emit(&verdict).is_ok());
        assert!(buffer.contents().contains("a.test"));
    }

    #[test]
    fn test_failing_finish_does_not_skip_other_summaries() {
        let buffer = SharedBuffer::default();
        let mut manager = OutputManager::new();
        manager.add_handler(Arc::new(FailingOutput));
        manager.add_handler(Arc::new(human::HumanOutput::to_writer(Box::new(buffer.clone()))));

        let verdicts = vec![create_test_verdict("a.test", Status::Ok)];
        assert!(manager.finish(&verdicts).is_ok());
        assert!(buffer.contents().contains("Summary:"));
    }

    #[test]
    fn test_single_failing_finish_reports_error() {
        let mut manager = OutputManager::new();
        manager.add_handler(Arc::new(FailingOutput));

        assert!(manager.finish(&[]).is_err());
    }
}
