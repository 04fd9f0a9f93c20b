// src/config.rs

use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::analyzer::{Policy, DEFAULT_MAX_AGE_DAYS, DEFAULT_MIN_LOGS};
use crate::ct_log::client::{CRTSH_URL_TEMPLATE, DOMAIN_PLACEHOLDER, GOOGLE_CT_URL_TEMPLATE};
use crate::ct_log::{CrtShSource, GoogleCtSource, LogSource};

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    #[serde(default = "default_min_logs")]
    pub min_logs: usize,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,
}

fn default_min_logs() -> usize { DEFAULT_MIN_LOGS }
fn default_max_age_days() -> i64 { DEFAULT_MAX_AGE_DAYS }

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_logs: default_min_logs(),
            max_age_days: default_max_age_days(),
        }
    }
}

impl PolicyConfig {
    pub fn to_policy(&self) -> Policy {
        Policy {
            min_logs: self.min_logs,
            max_age_days: self.max_age_days,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32, // 0 disables the per-run circuit breaker
}

fn default_timeout_secs() -> u64 { 10 }
fn default_max_concurrent() -> usize { 4 }
fn default_max_retries() -> u32 { 1 }
fn default_retry_backoff_ms() -> u64 { 1000 }
fn default_failure_threshold() -> u32 { 3 }

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_concurrent: default_max_concurrent(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            failure_threshold: default_failure_threshold(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Response format of a CT-log source
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// JSON array of crt.sh-style certificate objects
    Crtsh,
    /// Google Transparency Report certsearch payload
    Google,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub name: String,
    pub kind: SourceKind,
    #[serde(default)]
    pub url_template: Option<String>,
    #[serde(default = "default_source_enabled")]
    pub enabled: bool,
}

fn default_source_enabled() -> bool { true }

impl SourceConfig {
    /// Template with the kind's public endpoint as fallback
    pub fn url_template(&self) -> &str {
        match (&self.url_template, self.kind) {
            (Some(template), _) => template.as_str(),
            (None, SourceKind::Crtsh) => CRTSH_URL_TEMPLATE,
            (None, SourceKind::Google) => GOOGLE_CT_URL_TEMPLATE,
        }
    }

    pub fn build(&self, timeout: Duration) -> anyhow::Result<Arc<dyn LogSource>> {
        let template = self.url_template().to_string();
        let source: Arc<dyn LogSource> = match self.kind {
            SourceKind::Crtsh => Arc::new(CrtShSource::new(self.name.clone(), template, timeout)?),
            SourceKind::Google => Arc::new(GoogleCtSource::new(self.name.clone(), template, timeout)?),
        };
        Ok(source)
    }
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "crt.sh".to_string(),
            kind: SourceKind::Crtsh,
            url_template: None,
            enabled: true,
        },
        SourceConfig {
            name: "google".to_string(),
            kind: SourceKind::Google,
            url_template: None,
            enabled: false,
        },
    ]
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct OutputConfig {
    #[serde(default)]
    pub report_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            fetch: FetchConfig::default(),
            sources: default_sources(),
            logging: LoggingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    /// Enable exactly the named sources, disabling the rest
    pub fn enable_only(&mut self, names: &[String]) -> anyhow::Result<()> {
        for name in names {
            if !self.sources.iter().any(|s| &s.name == name) {
                anyhow::bail!("Unknown source '{}'", name);
            }
        }

        for source in &mut self.sources {
            source.enabled = names.contains(&source.name);
        }

        Ok(())
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.policy.min_logs == 0 {
            anyhow::bail!("policy.min_logs must be greater than 0");
        }
        if self.policy.max_age_days < 0 {
            anyhow::bail!("policy.max_age_days must not be negative");
        }
        if self.fetch.timeout_secs == 0 {
            anyhow::bail!("fetch.timeout_secs must be greater than 0");
        }
        if self.fetch.max_concurrent == 0 {
            anyhow::bail!("fetch.max_concurrent must be greater than 0");
        }
        if self.fetch.max_retries == 0 {
            anyhow::bail!("fetch.max_retries must be at least 1");
        }

        for (i, source) in self.sources.iter().enumerate() {
            // Health is tracked by name
            if self.sources[..i].iter().any(|s| s.name == source.name) {
                anyhow::bail!("Duplicate source name '{}'", source.name);
            }
            if !source.url_template().contains(DOMAIN_PLACEHOLDER) {
                anyhow::bail!(
                    "Source '{}' url_template must contain {}",
                    source.name,
                    DOMAIN_PLACEHOLDER
                );
            }
        }

        if self.enabled_sources().next().is_none() {
            anyhow::bail!("No CT-log source is enabled");
        }

        Ok(())
    }
}
