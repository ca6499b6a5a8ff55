//! sunwatch - watch sunshine data for a weather station
//!
//! Runs the fetch orchestrator against the simulated or HTTP backend and
//! prints every published snapshot. Logs go to stderr; snapshots to stdout.

use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sunwatch::cache::DatasetCache;
use sunwatch::cli::{Cli, Command, OutputFormat, ProviderChoice, SourceArgs, WatchArgs, WatchConfig};
use sunwatch::data::get_station_by_id;
use sunwatch::orchestrator::FetchOrchestrator;
use sunwatch::report::Report;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "sunwatch=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Prints the current snapshot of the orchestrator
fn print_snapshot(orchestrator: &FetchOrchestrator, format: OutputFormat) -> Result<(), serde_json::Error> {
    let report = Report::new(orchestrator.raw_state(), Utc::now().date_naive());
    match format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => println!("{}\n", report.to_text()),
    }
    Ok(())
}

async fn run_watch(args: WatchArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = WatchConfig::from_cli(&args)?;
    if get_station_by_id(&config.station).is_none() {
        tracing::warn!(station = %config.station, "Unknown station, the default station will be used");
    }

    let cache = if config.use_cache { DatasetCache::new() } else { None };
    let orchestrator =
        FetchOrchestrator::with_cache(config.provider.build(), config.orchestrator.clone(), cache);
    let mut updates = orchestrator.subscribe();
    orchestrator.activate(&config.station);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = !config.once;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let settled = {
                    let state = updates.borrow_and_update();
                    !state.loading && orchestrator.retry_count() == 0
                };
                print_snapshot(&orchestrator, config.output)?;
                if config.once && settled {
                    break;
                }
            }
            line = stdin.next_line(), if stdin_open => {
                match line? {
                    Some(command) => match command.trim() {
                        "r" => orchestrator.refetch(),
                        "a" => {
                            let enabled = !orchestrator.auto_refresh();
                            orchestrator.set_auto_refresh(enabled);
                            tracing::info!(enabled, "Auto-refresh toggled");
                        }
                        "q" => break,
                        "" => {}
                        other => tracing::warn!(command = other, "Unknown command (r, a, q)"),
                    },
                    None => stdin_open = false,
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    let failed = orchestrator.raw_state().error.is_some();
    orchestrator.deactivate();

    Ok(if config.once && failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn run_stations(args: SourceArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let provider = ProviderChoice::from_args(&args)?.build();
    for location in provider.available_locations().await {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            location.id, location.name, location.coordinates, location.elevation, location.timezone
        );
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_health(args: SourceArgs) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let provider = ProviderChoice::from_args(&args)?.build();
    match provider.check_health().await {
        Ok(report) => {
            println!("{} (uptime {}) at {}", report.status, report.uptime, report.timestamp.to_rfc3339());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("Health check failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Watch(args) => run_watch(args).await,
        Command::Stations(args) => run_stations(args).await,
        Command::Health(args) => run_health(args).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}
