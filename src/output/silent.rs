//! Silent output handler - produces no output

use crate::output::OutputHandler;
use crate::types::ComplianceVerdict;

/// Silent output handler
///
/// Used with --silent when only the exit code (and optionally the JSON report)
/// matters
pub struct SilentOutput;

impl OutputHandler for SilentOutput {
    fn emit_verdict(&self, _verdict: &ComplianceVerdict) -> anyhow::Result<()> {
        Ok(())
    }
}
