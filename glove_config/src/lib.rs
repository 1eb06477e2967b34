#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the glove controller.
//!
//! Every section has defaults, so an empty file (or no file at all) yields a
//! runnable configuration. `Config::validate` rejects values the control loop
//! cannot work with.
use serde::Deserialize;
use std::path::Path;

/// Largest value the control loop can emit.
pub const OUTPUT_MAX: i64 = 99;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SpiCfg {
    /// Chip-select index on controller 0 (`/dev/spidev0.<channel>`).
    pub channel: u8,
    /// Max clock rate in Hz; <= 0 selects the 5 MHz default.
    pub max_speed_hz: i64,
    /// Bits per word; <= 0 selects the 8-bit default.
    pub bits_per_word: i64,
    /// Report failed transfers as an all-zero reply instead of an error.
    /// Matches the behaviour of older firmware; leave off unless a consumer
    /// depends on it.
    pub legacy_mask_transfer_errors: bool,
}

impl Default for SpiCfg {
    fn default() -> Self {
        Self {
            channel: 0,
            max_speed_hz: 1_000_000,
            bits_per_word: 0,
            legacy_mask_transfer_errors: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SinkCfg {
    pub host: String,
    pub port: u16,
    /// Path component of the WebSocket URL, without the leading slash.
    pub endpoint: String,
}

impl Default for SinkCfg {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            endpoint: "ws".to_string(),
        }
    }
}

impl SinkCfg {
    pub fn url(&self) -> String {
        format!(
            "ws://{}:{}/{}",
            self.host,
            self.port,
            self.endpoint.trim_start_matches('/')
        )
    }

    pub fn origin(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControlCfg {
    /// Mapped values above this are clamped to it.
    pub ceiling: i64,
    /// Mapped values below this are sent as 0.
    pub comfort_floor: i64,
    /// Control loop period.
    pub poll_interval_ms: u64,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            ceiling: 99,
            comfort_floor: 20,
            poll_interval_ms: 150,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Samples taken per phase; the last one becomes the reference.
    pub window: u32,
    /// Interval between calibration samples.
    pub tick_ms: u64,
    /// Pause before and after each phase so the operator can reposition.
    pub settle_ms: u64,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            window: 3,
            tick_ms: 1000,
            settle_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub spi: SpiCfg,
    pub sink: SinkCfg,
    pub control: ControlCfg,
    pub calibration: CalibrationCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse `path`. Does not validate.
pub fn load_path(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {}", path.display(), e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // SPI
        if self.spi.channel > 1 {
            eyre::bail!("spi.channel must be 0 or 1");
        }

        // Sink
        if self.sink.host.trim().is_empty() {
            eyre::bail!("sink.host must not be empty");
        }
        if self.sink.port == 0 {
            eyre::bail!("sink.port must be >= 1");
        }

        // Control
        if !(0..=OUTPUT_MAX).contains(&self.control.ceiling) {
            eyre::bail!("control.ceiling must be in [0, {OUTPUT_MAX}]");
        }
        if self.control.comfort_floor < 0 {
            eyre::bail!("control.comfort_floor must be >= 0");
        }
        if self.control.comfort_floor > self.control.ceiling {
            eyre::bail!("control.comfort_floor must be <= control.ceiling");
        }
        if self.control.poll_interval_ms == 0 {
            eyre::bail!("control.poll_interval_ms must be >= 1");
        }

        // Calibration
        if self.calibration.window == 0 {
            eyre::bail!("calibration.window must be >= 1");
        }
        if self.calibration.tick_ms == 0 {
            eyre::bail!("calibration.tick_ms must be >= 1");
        }
        if self.calibration.settle_ms > 60 * 1000 {
            eyre::bail!("calibration.settle_ms is unreasonably large (>60s)");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
