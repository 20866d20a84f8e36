//! CLI entrypoint for the consensus engine
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use consensus_application::{JobManager, ProviderGateway};
use consensus_domain::{Job, JobId, JobOptions, JobStatus};
use consensus_infrastructure::{ConfigLoader, FileConfig, JsonlUsageLedger, Severity};
use consensus_presentation::{
    Cli, ConsoleFormatter, JobProgressView, OutputFormat, ProgressReporter, SimpleProgress,
};
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(&cli);

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("failed to load configuration")?
    };

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        println!();
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    check_config(&config)?;

    let Some(topic) = cli.topic.clone() else {
        bail!("A topic is required. Pass it as the first argument.");
    };

    // === Dependency Injection ===
    let registry = config.providers.build_registry();
    if registry.is_empty() {
        bail!("No provider has an API key. Set OPENAI_API_KEY, ANTHROPIC_API_KEY or GEMINI_API_KEY.");
    }
    info!(providers = ?registry.providers(), "Providers registered");

    let mut manager = JobManager::new(Arc::new(registry), config.to_consensus_config());
    if let Some(path) = &config.ledger.path {
        match JsonlUsageLedger::new(path) {
            Some(ledger) => {
                info!(path = %ledger.path().display(), "Usage ledger enabled");
                manager = manager.with_ledger(Arc::new(ledger));
            }
            None => warn!("Usage ledger disabled: cannot open {}", path.display()),
        }
    }
    manager.spawn_reaper();

    let sources = read_sources(&cli.source)?;
    let mut options = JobOptions::default().with_priority(cli.priority);
    if let Some(length) = cli.max_response_length {
        options = options.with_max_response_length(length);
    }

    let job_id = manager.create_job(topic, sources, options)?;
    let job = wait_for_job(&manager, &job_id, &cli).await;
    manager.shutdown().await;
    let job = job?;

    // === Output ===
    let output = match (cli.output, &job.result) {
        (OutputFormat::Json, _) => ConsoleFormatter::format_json(&job),
        (OutputFormat::Full, Some(result)) => ConsoleFormatter::format(result),
        (OutputFormat::Final, Some(result)) => ConsoleFormatter::format_final_only(result),
        (_, None) => {
            eprint!("{}", ConsoleFormatter::format_failure(&job));
            return Ok(ExitCode::FAILURE);
        }
    };
    println!("{}", output);

    Ok(if job.status == JobStatus::Completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Install the stderr subscriber, plus a daily log file when `--log-dir` is set.
fn init_tracing(cli: &Cli) -> Option<WorkerGuard> {
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let (file_layer, guard) = match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "consensus-engine.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    guard
}

fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Warning => warn!("config: {}", issue.message),
            Severity::Error => eprintln!("config error: {}", issue.message),
        }
    }
    if issues.iter().any(|issue| issue.is_error()) {
        bail!("invalid configuration");
    }
    Ok(())
}

/// Each `--source` is a file path when one exists, otherwise literal text.
fn read_sources(values: &[String]) -> Result<Vec<String>> {
    values
        .iter()
        .map(|value| {
            let path = Path::new(value);
            if path.is_file() {
                std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read source {}", path.display()))
            } else {
                Ok(value.clone())
            }
        })
        .collect()
}

/// Poll the job until it reaches a terminal status. Ctrl-C cancels it.
async fn wait_for_job<G: ProviderGateway + 'static>(
    manager: &JobManager<G>,
    job_id: &JobId,
    cli: &Cli,
) -> Result<Job> {
    let view: Option<Box<dyn JobProgressView>> = if cli.quiet {
        None
    } else if std::io::stderr().is_terminal() {
        Some(Box::new(ProgressReporter::new()))
    } else {
        Some(Box::new(SimpleProgress::new()))
    };

    let mut interval = tokio::time::interval(Duration::from_millis(cli.poll_interval_ms.max(10)));
    let mut interrupted = false;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                warn!(job_id = %job_id, "Interrupted, cancelling job");
                manager.cancel_job(job_id)?;
            }
        }

        let job = manager.get_status(job_id)?;
        if job.is_terminal() {
            if let Some(view) = &view {
                view.finish(&job);
            }
            return Ok(job);
        }
        if let Some(view) = &view {
            view.update(&job);
        }
    }
}
