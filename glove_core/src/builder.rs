//! Builder for `ControlLoop`.
//!
//! All pieces are checked in `try_build()`; a loop that builds is ready to run.

use glove_traits::{Sink, SpiBus};

use crate::calibration::Calibration;
use crate::config::{ControlCfg, OUTPUT_MAX, OUTPUT_MIN};
use crate::error::{BuildError, Result};
use crate::runner::ControlLoop;

pub struct ControlLoopBuilder<B, S> {
    bus: Option<B>,
    sink: Option<S>,
    calibration: Option<Calibration>,
    control: Option<ControlCfg>,
    max_ticks: Option<u64>,
}

impl<B, S> Default for ControlLoopBuilder<B, S> {
    fn default() -> Self {
        Self {
            bus: None,
            sink: None,
            calibration: None,
            control: None,
            max_ticks: None,
        }
    }
}

impl<B: SpiBus, S: Sink> ControlLoop<B, S> {
    /// Start building a control loop.
    pub fn builder() -> ControlLoopBuilder<B, S> {
        ControlLoopBuilder::default()
    }
}

/// Shared validation for `try_build()`.
fn validate_control(c: &ControlCfg) -> Result<()> {
    if !(OUTPUT_MIN..=OUTPUT_MAX).contains(&c.ceiling) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "ceiling must be within [0, 99]",
        )));
    }
    if c.comfort_floor < 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "comfort_floor must be >= 0",
        )));
    }
    if c.comfort_floor > c.ceiling {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "comfort_floor must be <= ceiling",
        )));
    }
    if c.period.is_zero() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "period must be > 0",
        )));
    }
    Ok(())
}

impl<B: SpiBus, S: Sink> ControlLoopBuilder<B, S> {
    pub fn with_bus(mut self, bus: B) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_sink(mut self, sink: S) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = Some(calibration);
        self
    }

    pub fn with_control(mut self, control: ControlCfg) -> Self {
        self.control = Some(control);
        self
    }

    /// Stop cleanly after this many sent ticks. `None` runs until shutdown.
    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn try_build(self) -> Result<ControlLoop<B, S>> {
        let bus = self
            .bus
            .ok_or_else(|| eyre::Report::new(BuildError::MissingBus))?;
        let sink = self
            .sink
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSink))?;
        let calibration = self
            .calibration
            .ok_or_else(|| eyre::Report::new(BuildError::MissingCalibration))?;
        let control = self.control.unwrap_or_default();

        validate_control(&control)?;
        calibration.ensure_distinct().map_err(eyre::Report::new)?;
        if self.max_ticks == Some(0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "max_ticks must be >= 1",
            )));
        }

        Ok(ControlLoop {
            bus,
            sink,
            calibration,
            control,
            max_ticks: self.max_ticks,
            ticks: 0,
            overruns: 0,
            last_value: None,
        })
    }
}
