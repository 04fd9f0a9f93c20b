// src/cli.rs
use clap::Parser;

use crate::config::Config;

/// ct-compliance: Certificate Transparency compliance checker
///
/// Queries CT-log aggregators for each domain's certificates and classifies
/// the domain as OK, WARNING or ERROR. Exit code is 0, 1 or 2 accordingly.
#[derive(Parser, Debug, Clone)]
#[command(name = "ct-compliance")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    // ===== Input & Configuration =====
    /// Comma-separated list of domains to check
    #[arg(short = 'd', long = "domains", required = true, value_delimiter = ',')]
    pub domains: Vec<String>,

    /// Path to TOML config file (defaults apply when omitted)
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    // ===== Policy =====
    /// Minimum number of distinct CT logs a certificate should appear in
    #[arg(long = "min-logs")]
    pub min_logs: Option<usize>,

    /// Maximum age in days for certificates to count
    #[arg(long = "max-age-days")]
    pub max_age_days: Option<i64>,

    // ===== Sources & Performance =====
    /// Comma-separated source names to query (e.g. crt.sh,google)
    #[arg(long = "sources", value_delimiter = ',')]
    pub sources: Option<Vec<String>>,

    /// Per-request timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Domains checked concurrently
    #[arg(long = "concurrency")]
    pub concurrency: Option<usize>,

    // ===== Output =====
    /// Path to write the JSON report to
    #[arg(short = 'o', long = "output-json")]
    pub output_json: Option<String>,

    /// Print verdicts as JSON Lines on stdout
    #[arg(short = 'j', long = "json")]
    pub json: bool,

    /// Print verdicts as CSV on stdout
    #[arg(long = "csv")]
    pub csv: bool,

    /// Print nothing on stdout; rely on the exit code and report file
    #[arg(short = 's', long = "silent")]
    pub silent: bool,

    /// Disable progress bar
    #[arg(long = "no-progress")]
    pub no_progress: bool,

    // ===== Logging =====
    /// Verbose logging (set log level to debug)
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Quiet logging (set log level to warn)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    /// Validate flag combinations and return errors for invalid usage
    pub fn validate(&self) -> anyhow::Result<()> {
        let format_count = [self.json, self.csv, self.silent]
            .iter()
            .filter(|&&x| x)
            .count();

        if format_count > 1 {
            anyhow::bail!(
                "Cannot specify multiple output formats. \
                Choose one of: --json, --csv, or --silent"
            );
        }

        if self.verbose && self.quiet {
            anyhow::bail!("Cannot specify both --verbose and --quiet");
        }

        if self.domain_list().is_empty() {
            anyhow::bail!("--domains must name at least one domain");
        }

        Ok(())
    }

    /// Requested domains, trimmed, empty entries dropped, order kept
    pub fn domain_list(&self) -> Vec<String> {
        self.domains
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Apply command-line overrides on top of the loaded config
    pub fn apply_overrides(&self, config: &mut Config) -> anyhow::Result<()> {
        if let Some(min_logs) = self.min_logs {
            config.policy.min_logs = min_logs;
        }
        if let Some(max_age_days) = self.max_age_days {
            config.policy.max_age_days = max_age_days;
        }
        if let Some(timeout) = self.timeout {
            config.fetch.timeout_secs = timeout;
        }
        if let Some(concurrency) = self.concurrency {
            config.fetch.max_concurrent = concurrency;
        }
        if let Some(ref sources) = self.sources {
            let names: Vec<String> = sources.iter().map(|s| s.trim().to_string()).collect();
            config.enable_only(&names)?;
        }
        if let Some(ref path) = self.output_json {
            config.output.report_path = Some(path.clone());
        }
        Ok(())
    }

    /// Determine the output format based on flags
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.csv {
            OutputFormat::Csv
        } else if self.silent {
            OutputFormat::Silent
        } else {
            OutputFormat::Human
        }
    }

    /// Progress bar only for human output
    pub fn should_show_progress(&self) -> bool {
        !self.no_progress && self.output_format() == OutputFormat::Human
    }

    /// Log level from flags, if they force one
    pub fn log_level(&self) -> Option<&str> {
        if self.verbose {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable colored text output (default)
    Human,
    /// JSON Lines format (one verdict per line)
    Json,
    /// CSV format
    Csv,
    /// No stdout output
    Silent,
}
