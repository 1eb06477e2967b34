//! `From` implementations bridging `glove_config` types to `glove_core` types.

use std::time::Duration;

use crate::config::{CalibrationCfg, ControlCfg};

impl From<&glove_config::ControlCfg> for ControlCfg {
    fn from(c: &glove_config::ControlCfg) -> Self {
        Self {
            ceiling: c.ceiling,
            comfort_floor: c.comfort_floor,
            period: Duration::from_millis(c.poll_interval_ms),
        }
    }
}

impl From<&glove_config::CalibrationCfg> for CalibrationCfg {
    fn from(c: &glove_config::CalibrationCfg) -> Self {
        Self {
            window: c.window,
            tick: Duration::from_millis(c.tick_ms),
            settle: Duration::from_millis(c.settle_ms),
        }
    }
}
