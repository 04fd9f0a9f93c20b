//! JSON run report file

use anyhow::Context;
use std::path::Path;

use crate::types::RunReport;

/// Write the report as pretty-printed JSON, replacing any existing file
pub async fn write_report(report: &RunReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;

    // Write beside the target, then rename into place
    let temp_path = path.with_extension("json.tmp");

    tokio::fs::write(&temp_path, json)
        .await
        .with_context(|| format!("Failed to write JSON report to {}", temp_path.display()))?;

    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(anyhow::Error::new(e)
            .context(format!("Failed to write JSON report to {}", path.display())));
    }

    Ok(())
}

/// Load a report previously written by [`write_report`]
pub async fn read_report(path: &Path) -> anyhow::Result<RunReport> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read JSON report {}", path.display()))?;

    serde_json::from_str(&contents).context("Failed to parse JSON report")
}
