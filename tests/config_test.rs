// Test configuration loading
use ct_compliance::cli::Cli;
use ct_compliance::config::{Config, SourceKind};
use clap::Parser;
use std::path::Path;

#[test]
fn test_load_test_config() {
    let config_path = Path::new("tests/test_config.toml");
    let config = Config::from_file(config_path).expect("Failed to load test config");

    assert_eq!(config.policy.min_logs, 2);
    assert_eq!(config.policy.max_age_days, 45);

    assert_eq!(config.fetch.timeout_secs, 15);
    assert_eq!(config.fetch.max_concurrent, 2);
    assert_eq!(config.fetch.max_retries, 3);
    assert_eq!(config.fetch.retry_backoff_ms, 250);
    assert_eq!(config.fetch.failure_threshold, 4);

    assert_eq!(config.sources.len(), 3);
    let mirror = config
        .sources
        .iter()
        .find(|s| s.name == "internal-mirror")
        .unwrap();
    assert_eq!(mirror.kind, SourceKind::Crtsh);
    assert!(mirror.url_template().starts_with("https://ct-mirror.example.net/"));

    let enabled: Vec<_> = config.enabled_sources().map(|s| s.name.as_str()).collect();
    assert_eq!(enabled, vec!["crt.sh", "internal-mirror"]);

    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.output.report_path.as_deref(), Some("ct-report.json"));

    assert!(config.validate().is_ok());
}

#[test]
fn test_cli_overrides_file_config() {
    let mut config = Config::from_file(Path::new("tests/test_config.toml")).unwrap();
    let cli = Cli::parse_from([
        "ct-compliance",
        "--domains", "a.test",
        "--config", "tests/test_config.toml",
        "--max-age-days", "10",
        "--sources", "google",
    ]);

    cli.apply_overrides(&mut config).unwrap();

    assert_eq!(config.policy.max_age_days, 10);
    assert_eq!(config.policy.min_logs, 2);
    let enabled: Vec<_> = config.enabled_sources().map(|s| s.name.as_str()).collect();
    assert_eq!(enabled, vec!["google"]);
    assert!(config.validate().is_ok());
}
