//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Fleet Emissions - real-time CO2 estimation for vehicle fleets
#[derive(Parser, Debug)]
#[command(
    name = "fleet-emissions",
    author,
    version,
    about = "Fleet CO2 emission pipeline",
    long_about = "Replays vehicle position and telemetry streams, joins them, estimates \n\
                  CO2 per reading, raises idle and spike alerts, aggregates tumbling \n\
                  windows per vehicle, and dispatches the results to configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FLEET_EMISSIONS_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FLEET_EMISSIONS_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the emission pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "config.toml",
        env = "FLEET_EMISSIONS_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the position NDJSON file from configuration
    #[arg(long, env = "FLEET_EMISSIONS_POSITIONS")]
    pub positions: Option<PathBuf>,

    /// Override the telemetry NDJSON file from configuration
    #[arg(long, env = "FLEET_EMISSIONS_TELEMETRY")]
    pub telemetry: Option<PathBuf>,

    /// Stop after this many emission records (0 = unlimited)
    #[arg(long, default_value = "0", env = "FLEET_EMISSIONS_MAX_RECORDS")]
    pub max_records: u64,

    /// Override replay pacing (0 = as fast as possible, 1 = event time)
    #[arg(long, env = "FLEET_EMISSIONS_REPLAY_SPEED")]
    pub replay_speed: Option<f64>,

    /// Channel buffer size for internal queues
    #[arg(long, env = "FLEET_EMISSIONS_BUFFER_SIZE")]
    pub buffer_size: Option<usize>,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FLEET_EMISSIONS_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml", env = "FLEET_EMISSIONS_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "FLEET_EMISSIONS_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
