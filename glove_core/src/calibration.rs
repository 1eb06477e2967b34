//! Two-phase calibration: capture an "open" and a "closed" reference sample.
//!
//! Each phase is a small state machine driven by a fixed-interval tick:
//! `AwaitingSample { remaining }` captures one sample per tick (overwriting the
//! previous one) until `remaining` reaches 0; the next tick settles on the last
//! captured sample. No averaging: the last sample of the window wins.

use std::fmt;

use glove_traits::SpiBus;
use glove_traits::clock::Clock;
use tracing::info;

use crate::config::CalibrationCfg;
use crate::error::{GloveError, Report, Result};
use crate::sensor::{RawSample, read_sample};

/// Reference samples captured at startup. Immutable for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    open: RawSample,
    closed: RawSample,
}

impl Calibration {
    pub fn new(open: RawSample, closed: RawSample) -> Self {
        Self { open, closed }
    }

    pub fn open(&self) -> RawSample {
        self.open
    }

    pub fn closed(&self) -> RawSample {
        self.closed
    }

    /// `(min_ref, max_ref)` as used by the output mapping: closed, open.
    pub fn bounds(&self) -> (i64, i64) {
        (i64::from(self.closed), i64::from(self.open))
    }

    /// Reject a calibration whose references coincide; the mapping would
    /// divide by zero.
    pub fn ensure_distinct(&self) -> std::result::Result<(), GloveError> {
        if self.open == self.closed {
            return Err(GloveError::DegenerateCalibration(i64::from(self.open)));
        }
        Ok(())
    }
}

/// Physical position the operator holds during a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Open,
    Closed,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    AwaitingSample {
        remaining: u32,
        last: Option<RawSample>,
    },
    Settled(RawSample),
}

/// One calibration phase.
#[derive(Debug, Clone)]
pub struct Phase {
    state: PhaseState,
}

impl Phase {
    /// A phase that captures `window` samples (at least one).
    pub fn new(window: u32) -> Self {
        Self {
            state: PhaseState::AwaitingSample {
                remaining: window.max(1),
                last: None,
            },
        }
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn settled(&self) -> Option<RawSample> {
        match self.state {
            PhaseState::Settled(s) => Some(s),
            PhaseState::AwaitingSample { .. } => None,
        }
    }

    /// Advance by one timer tick. A read error leaves the state untouched.
    pub fn tick<B: SpiBus + ?Sized>(
        &mut self,
        bus: &mut B,
    ) -> std::result::Result<PhaseState, GloveError> {
        self.state = match self.state {
            settled @ PhaseState::Settled(_) => settled,
            PhaseState::AwaitingSample {
                remaining: 0,
                last: Some(s),
            } => PhaseState::Settled(s),
            PhaseState::AwaitingSample { remaining, .. } => {
                let sample = read_sample(bus)?;
                PhaseState::AwaitingSample {
                    remaining: remaining.saturating_sub(1),
                    last: Some(sample),
                }
            }
        };
        Ok(self.state)
    }
}

/// Runs both phases with operator pauses, sleeping on `clock`.
pub struct Calibrator<C: Clock> {
    cfg: CalibrationCfg,
    clock: C,
}

impl<C: Clock> Calibrator<C> {
    pub fn new(cfg: CalibrationCfg, clock: C) -> Self {
        Self { cfg, clock }
    }

    /// Run a single phase to completion and return its reference sample.
    pub fn run_phase<B: SpiBus + ?Sized>(
        &self,
        bus: &mut B,
        position: Position,
    ) -> Result<RawSample> {
        info!(%position, "calibrating: hold the glove in the {position} position");
        let mut phase = Phase::new(self.cfg.window);
        loop {
            self.clock.sleep(self.cfg.tick);
            if let PhaseState::Settled(s) = phase.tick(bus).map_err(Report::new)? {
                info!(%position, reference = s.value(), "calibration phase settled");
                return Ok(s);
            }
        }
    }

    /// Pause, open phase, pause, closed phase, pause.
    ///
    /// Does not reject equal references; callers that map against the result
    /// check `Calibration::ensure_distinct`.
    pub fn calibrate<B: SpiBus + ?Sized>(&self, bus: &mut B) -> Result<Calibration> {
        info!(
            window = self.cfg.window,
            tick_ms = u64::try_from(self.cfg.tick.as_millis()).unwrap_or(u64::MAX),
            "setting up sensor"
        );
        self.clock.sleep(self.cfg.settle);
        let open = self.run_phase(bus, Position::Open)?;
        self.clock.sleep(self.cfg.settle);
        let closed = self.run_phase(bus, Position::Closed)?;
        self.clock.sleep(self.cfg.settle);
        let cal = Calibration::new(open, closed);
        info!(open = open.value(), closed = closed.value(), "calibration complete");
        Ok(cal)
    }
}
