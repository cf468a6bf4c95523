//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Tracker Bridge - remote tracked devices for a VR host runtime
#[derive(Parser, Debug)]
#[command(
    name = "tracker-bridge",
    author,
    version,
    about = "Bridge remote motion streams into tracked devices",
    long_about = "Runs head and hand devices fed by a remote motion stream.\n\n\
                  Loads the device configuration, activates every device against a \n\
                  simulated host runtime, streams synthetic or recorded motion and \n\
                  reports pose delivery statistics."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TRACKER_BRIDGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TRACKER_BRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a bridge session
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
        env = "TRACKER_BRIDGE_CONFIG"
    )]
    pub config: PathBuf,

    /// Session length in seconds (0 = until Ctrl+C)
    #[arg(long, default_value = "10", env = "TRACKER_BRIDGE_DURATION")]
    pub duration: u64,

    /// Synthetic motion rate in Hz
    #[arg(long, default_value = "90")]
    pub rate: f64,

    /// Replay a recorded JSONL motion log instead of synthetic motion
    #[arg(long, env = "TRACKER_BRIDGE_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = recorded pace)
    #[arg(long, default_value = "1.0")]
    pub replay_speed: f64,

    /// Restart the replay when it ends
    #[arg(long)]
    pub replay_loop: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TRACKER_BRIDGE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show configured properties per device
    #[arg(long)]
    pub properties: bool,

    /// List every property name the host key table knows
    #[arg(long)]
    pub keys: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
