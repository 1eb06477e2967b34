//! Runtime configuration for the calibration controller and control loop.
//!
//! These are the structs the engine consumes. They are separate from the
//! TOML-deserialized config in `glove_config`; see `conversions`.

use std::time::Duration;

/// Output range of the control value.
pub const OUTPUT_MIN: i64 = 0;
pub const OUTPUT_MAX: i64 = 99;

/// Control loop cadence and output shaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlCfg {
    /// Mapped values above this are clamped to it. Must lie in `[0, 99]`.
    pub ceiling: i64,
    /// Mapped values below this are sent as 0 (dead zone near rest).
    pub comfort_floor: i64,
    /// Timer period between ticks.
    pub period: Duration,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            ceiling: OUTPUT_MAX,
            comfort_floor: 20,
            period: Duration::from_millis(150),
        }
    }
}

/// Calibration pacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationCfg {
    /// Samples per phase; the last one wins.
    pub window: u32,
    /// Interval between calibration ticks.
    pub tick: Duration,
    /// Operator pause around each phase.
    pub settle: Duration,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            window: 3,
            tick: Duration::from_secs(1),
            settle: Duration::from_secs(1),
        }
    }
}
