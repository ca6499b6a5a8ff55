//! Command-line interface parsing for sunwatch
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! validated startup configuration for the `watch` and `health` commands.

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::data::DEFAULT_STATION_ID;
use crate::orchestrator::OrchestratorConfig;
use crate::provider::http::DEFAULT_BASE_URL;
use crate::provider::simulated::DEFAULT_ERROR_RATE;
use crate::provider::{DataProvider, HttpProvider, SimulatedProvider};

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq)]
pub enum CliError {
    /// A refresh interval of zero seconds was given
    #[error("Invalid refresh interval: must be at least 1 second")]
    ZeroRefreshInterval,

    /// The simulated error rate is not a probability
    #[error("Invalid error rate: {0}. Expected a value between 0 and 1")]
    InvalidErrorRate(f64),

    /// Options that only apply to one data source were given for another
    #[error("--{option} only applies to the {applies_to} source")]
    OptionNotApplicable {
        option: &'static str,
        applies_to: &'static str,
    },
}

/// sunwatch - resilient sunshine data for weather stations
#[derive(Parser, Debug)]
#[command(name = "sunwatch")]
#[command(about = "Fetch and watch sunshine data with retry, backoff and auto-refresh")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch data for a station and keep it fresh
    ///
    /// While running, type `r` + Enter to refetch, `a` to toggle
    /// auto-refresh and `q` to quit.
    Watch(WatchArgs),
    /// List the stations the data source can serve
    Stations(SourceArgs),
    /// Check that the data source is healthy
    Health(SourceArgs),
}

/// Where data comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Source {
    /// Built-in simulated backend
    Simulated,
    /// REST backend at --api-url
    Http,
}

#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Data source to use
    #[arg(long, value_enum, default_value_t = Source::Simulated)]
    pub source: Source,

    /// Base URL of the REST backend (http source)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Probability that a simulated request fails (simulated source)
    #[arg(long, value_name = "P")]
    pub error_rate: Option<f64>,

    /// Seed for reproducible simulated data (simulated source)
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Station to watch; unknown ids fall back to the default station
    #[arg(long, default_value = DEFAULT_STATION_ID)]
    pub station: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Seconds between silent background refreshes
    #[arg(long, value_name = "SECS")]
    pub refresh_interval: Option<u64>,

    /// Disable the background refresh
    #[arg(long)]
    pub no_auto_refresh: bool,

    /// Seed from, and save to, the on-disk dataset cache
    #[arg(long)]
    pub cache: bool,

    /// Print snapshots as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit once the first fetch sequence has settled
    #[arg(long)]
    pub once: bool,
}

/// Validated data source selection
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderChoice {
    Simulated { error_rate: f64, seed: Option<u64> },
    Http { base_url: String },
}

impl ProviderChoice {
    pub fn from_args(args: &SourceArgs) -> Result<Self, CliError> {
        match args.source {
            Source::Simulated => {
                if args.api_url.is_some() {
                    return Err(CliError::OptionNotApplicable {
                        option: "api-url",
                        applies_to: "http",
                    });
                }
                let error_rate = args.error_rate.unwrap_or(DEFAULT_ERROR_RATE);
                if !(0.0..=1.0).contains(&error_rate) {
                    return Err(CliError::InvalidErrorRate(error_rate));
                }
                Ok(ProviderChoice::Simulated {
                    error_rate,
                    seed: args.seed,
                })
            }
            Source::Http => {
                if args.error_rate.is_some() || args.seed.is_some() {
                    let option = if args.error_rate.is_some() { "error-rate" } else { "seed" };
                    return Err(CliError::OptionNotApplicable {
                        option,
                        applies_to: "simulated",
                    });
                }
                Ok(ProviderChoice::Http {
                    base_url: args
                        .api_url
                        .clone()
                        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                })
            }
        }
    }

    pub fn build(&self) -> Arc<dyn DataProvider> {
        match self {
            ProviderChoice::Simulated { error_rate, seed } => {
                let provider = SimulatedProvider::new().with_error_rate(*error_rate);
                match seed {
                    Some(seed) => Arc::new(provider.with_seed(*seed)),
                    None => Arc::new(provider),
                }
            }
            ProviderChoice::Http { base_url } => Arc::new(HttpProvider::with_base_url(base_url)),
        }
    }
}

/// How snapshots are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for the `watch` command
#[derive(Debug, Clone, PartialEq)]
pub struct WatchConfig {
    pub station: String,
    pub provider: ProviderChoice,
    pub orchestrator: OrchestratorConfig,
    pub use_cache: bool,
    pub output: OutputFormat,
    pub once: bool,
}

impl WatchConfig {
    /// Creates a WatchConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(WatchConfig)` with defaults filled in
    /// * `Err(CliError)` if a value is out of range or does not apply to the source
    pub fn from_cli(args: &WatchArgs) -> Result<Self, CliError> {
        let provider = ProviderChoice::from_args(&args.source)?;

        let mut orchestrator = OrchestratorConfig {
            auto_refresh: !args.no_auto_refresh,
            ..OrchestratorConfig::default()
        };
        if let Some(secs) = args.refresh_interval {
            if secs == 0 {
                return Err(CliError::ZeroRefreshInterval);
            }
            orchestrator.refresh_interval = Duration::from_secs(secs);
        }

        Ok(WatchConfig {
            station: args.station.clone(),
            provider,
            orchestrator,
            use_cache: args.cache,
            output: if args.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            once: args.once,
        })
    }
}
