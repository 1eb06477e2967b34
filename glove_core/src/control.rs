//! Sample -> control value pipeline: invert, map, clamp, dead zone.

use std::fmt;

use crate::calibration::Calibration;
use crate::config::{ControlCfg, OUTPUT_MAX, OUTPUT_MIN};
use crate::error::GloveError;
use crate::mapping::linear_map;
use crate::sensor::RawSample;

/// Sent once on shutdown to bring the consumer to rest.
pub const STOP_MESSAGE: &str = "0,0";

/// The value streamed to the consumer each tick, in `[0, 99]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ControlValue(u8);

impl ControlValue {
    pub const ZERO: Self = Self(0);

    pub fn value(self) -> u8 {
        self.0
    }

    /// Wire form: `"<value>,0"`.
    pub fn message(self) -> String {
        format!("{},0", self.0)
    }
}

impl fmt::Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Apply the ceiling, then force anything under the comfort floor to 0.
/// Values that end up negative are sent as 0 as well.
pub fn shape(mapped: i64, cfg: &ControlCfg) -> ControlValue {
    let mut v = mapped;
    if v > cfg.ceiling {
        v = cfg.ceiling;
    }
    if v < cfg.comfort_floor {
        v = 0;
    }
    let v = v.clamp(OUTPUT_MIN, OUTPUT_MAX);
    // Clamped to [0, 99] above.
    ControlValue(u8::try_from(v).unwrap_or(0))
}

/// Map a live sample against the calibration bounds.
///
/// The reading is inverted (`min + max - sample`) before mapping, with the
/// closed reference as the lower bound and the open reference as the upper:
/// a sample at the open reference maps to 0, one at the closed reference to 99.
pub fn map_sample(sample: RawSample, calibration: &Calibration) -> Result<i64, GloveError> {
    let (min_ref, max_ref) = calibration.bounds();
    let inverted = min_ref + max_ref - i64::from(sample);
    linear_map(inverted, min_ref, max_ref, OUTPUT_MIN, OUTPUT_MAX)
}

/// Full per-tick computation.
pub fn control_value(
    sample: RawSample,
    calibration: &Calibration,
    cfg: &ControlCfg,
) -> Result<ControlValue, GloveError> {
    Ok(shape(map_sample(sample, calibration)?, cfg))
}
