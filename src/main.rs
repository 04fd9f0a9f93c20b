// src/main.rs
use clap::Parser;
use ct_compliance::analyzer::CertificateAnalyzer;
use ct_compliance::cli::{Cli, OutputFormat};
use ct_compliance::clock::SystemClock;
use ct_compliance::config::Config;
use ct_compliance::ct_log::{LogFetcher, LogSource, RunCoordinator, SourceHealthTracker};
use ct_compliance::output::{csv, human, json, report, silent, OutputManager};
use ct_compliance::progress::ProgressIndicator;
use ct_compliance::stats::RunStats;
use std::future::Future;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Exit code for setup failures (bad flags, unreadable config)
const EXIT_SETUP_FAILURE: u8 = 3;
/// Exit code after Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_SETUP_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<u8> {
    cli.validate()?;

    let mut config = match cli.config {
        Some(ref path) => Config::from_file(Path::new(path))?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut config)?;
    config.validate()?;

    // Logs go to stderr so stdout stays clean for JSON/CSV
    let log_level = cli.log_level().unwrap_or(&config.logging.level);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let domains = cli.domain_list();

    let mut sources: Vec<Arc<dyn LogSource>> = Vec::new();
    for source_config in config.enabled_sources() {
        sources.push(source_config.build(config.fetch.timeout())?);
        tracing::debug!("Enabled source {} ({})", source_config.name, source_config.url_template());
    }

    let health = Arc::new(SourceHealthTracker::new(config.fetch.failure_threshold));
    let fetcher = LogFetcher::new(sources, health)
        .with_retries(config.fetch.max_retries, config.fetch.retry_backoff());

    let coordinator = RunCoordinator::new(
        Arc::new(fetcher),
        CertificateAnalyzer::new(config.policy.to_policy()),
        Arc::new(SystemClock),
        config.fetch.max_concurrent,
    );

    let mut output_manager = OutputManager::new();
    match cli.output_format() {
        OutputFormat::Human => output_manager.add_handler(Arc::new(human::HumanOutput::new())),
        OutputFormat::Json => output_manager.add_handler(Arc::new(json::JsonOutput::new())),
        OutputFormat::Csv => output_manager.add_handler(Arc::new(csv::CsvOutput::new())),
        OutputFormat::Silent => output_manager.add_handler(Arc::new(silent::SilentOutput)),
    }

    let stats = RunStats::new();
    let progress = ProgressIndicator::new(
        cli.should_show_progress() && is_terminal::is_terminal(std::io::stderr()),
        domains.len(),
    );

    let outcome = tokio::select! {
        outcome = coordinator.run(&domains, &output_manager, &stats, &progress) => outcome,
        _ = wait_for_interrupt(tokio::signal::ctrl_c()) => {
            progress.finish();
            tracing::warn!("Interrupted; outstanding lookups aborted, no report written");
            return Ok(EXIT_INTERRUPTED);
        }
    };

    let exit_code = outcome.exit_code();

    if let Some(ref path) = config.output.report_path {
        let report = outcome.into_report(domains);
        match report::write_report(&report, Path::new(path)).await {
            Ok(()) => tracing::info!("JSON report written to {}", path),
            Err(e) => tracing::error!("Error writing JSON report: {:#}", e),
        }
    }

    Ok(exit_code)
}

/// Resolve on Ctrl-C; if the handler cannot be installed, never resolve
async fn wait_for_interrupt<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::warn!("Unable to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
