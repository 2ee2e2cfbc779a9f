use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;

use drone_triage::config::{TOKEN_ENV_VAR, TriageConfig};
use drone_triage::drone::{BuildSource, DroneClient};
use drone_triage::render;
use drone_triage::scan::{ScanOptions, Scanner};
use drone_triage::telemetry::{NoTelemetry, TelemetryNotifier, WebhookNotifier};
use drone_triage_core::FailureReport;

/// Output format for rendered reports.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Markdown,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "drone-triage")]
#[command(about = "Summarize failing CI builds from their step logs")]
struct Cli {
    /// Build number to inspect. Scans the configured backlog when omitted.
    build: Option<u64>,
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "triage.yaml")]
    config: PathBuf,
    /// Output format for reports.
    #[arg(long, default_value = "markdown")]
    format: CliOutputFormat,
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let config = TriageConfig::load(&cli.config).map_err(|err| err.to_string())?;
    let token = config
        .resolve_token(std::env::var(TOKEN_ENV_VAR).ok())
        .map_err(|err| err.to_string())?;

    let timeout = Duration::from_secs(config.scan.log_timeout_secs);
    let client = DroneClient::new(&config.server.url, &config.server.repo, &token, timeout)
        .map_err(|err| err.to_string())?;

    let telemetry: Box<dyn TelemetryNotifier> = match &config.telemetry {
        Some(sink) => {
            Box::new(WebhookNotifier::new(&sink.url, timeout).map_err(|err| err.to_string())?)
        }
        None => Box::new(NoTelemetry),
    };

    let options = ScanOptions {
        stage_timeout_secs: config.scan.stage_timeout_secs,
        jobs: config.scan.jobs,
    };
    let scanner = Scanner::new(&client, telemetry.as_ref(), options);

    match cli.build {
        Some(number) => run_single(&scanner, &client, number, cli.format),
        None => run_backlog(&scanner, &config, cli.format),
    }
}

fn run_single(
    scanner: &Scanner<'_>,
    client: &DroneClient,
    number: u64,
    format: CliOutputFormat,
) -> Result<(), String> {
    let build = client.build(number).map_err(|err| err.to_string())?;
    let report = scanner.scan_build(&build).map_err(|err| err.to_string())?;
    print_report(&report, format)
}

fn run_backlog(
    scanner: &Scanner<'_>,
    config: &TriageConfig,
    format: CliOutputFormat,
) -> Result<(), String> {
    let outcome = scanner
        .scan_backlog(&config.scan.source_ref, config.scan.min_build)
        .map_err(|err| err.to_string())?;

    if matches!(format, CliOutputFormat::Markdown) {
        println!(
            "Failure report for {} on {} — generated {}",
            config.server.repo,
            config.scan.source_ref,
            Utc::now().to_rfc3339()
        );
        println!();
    }

    for report in &outcome.reports {
        print_report(report, format)?;
    }

    if outcome.reports.is_empty() && outcome.failures.is_empty() {
        println!("No builds needed attention.");
    }

    if !outcome.failures.is_empty() {
        for failure in &outcome.failures {
            eprintln!(
                "build {} could not be scanned: {}",
                failure.build, failure.error
            );
        }
        return Err(format!(
            "{} build(s) could not be scanned",
            outcome.failures.len()
        ));
    }

    Ok(())
}

fn print_report(report: &FailureReport, format: CliOutputFormat) -> Result<(), String> {
    let rendered = match format {
        CliOutputFormat::Markdown => render::render_markdown(report),
        CliOutputFormat::Json => render::render_json(report)
            .map_err(|err| format!("failed to serialize report: {err}"))?,
    };
    println!("{rendered}");
    Ok(())
}
