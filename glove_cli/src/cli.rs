//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "glove", version, about = "Bend-sensor glove controller")]
pub struct Cli {
    /// Path to config TOML; defaults are used when the file does not exist
    #[arg(long, value_name = "FILE", default_value = "etc/glove.toml")]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Where control values are written.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum SinkKind {
    /// WebSocket client to `ws://<host>:<port>/<endpoint>`
    #[default]
    Ws,
    /// One message per line on stdout
    Stdout,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Calibrate, then stream control values until interrupted
    Run {
        /// Consumer host (overrides sink.host)
        #[arg(long)]
        host: Option<String>,
        /// Consumer port (overrides sink.port)
        #[arg(long)]
        port: Option<u16>,
        /// WebSocket path (overrides sink.endpoint)
        #[arg(long)]
        endpoint: Option<String>,
        /// Highest value ever sent, 0..=99 (overrides control.ceiling)
        #[arg(long, value_name = "N")]
        ceiling: Option<i64>,
        /// Values below this are sent as 0 (overrides control.comfort_floor)
        #[arg(long = "comfort-floor", value_name = "N")]
        comfort_floor: Option<i64>,
        /// Output transport
        #[arg(long, value_enum, default_value_t = SinkKind::Ws)]
        sink: SinkKind,
        /// Stop cleanly after N ticks, sending the stop message as on shutdown
        #[arg(long = "max-ticks", value_name = "N")]
        max_ticks: Option<u64>,
    },
    /// Open the bus, report its configuration and read one sample
    SelfCheck,
    /// Run only the two calibration phases and print the references
    Calibrate,
}
