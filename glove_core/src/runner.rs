//! Steady-state control loop.
//!
//! One control flow waits on whichever of {timer tick, shutdown} fires first.
//! A tick reads the sensor, maps the sample and sends one message; shutdown
//! sends the stop message and ends the loop. Every error is fatal and is
//! returned without sending anything further.
use crossbeam_channel as xch;
use glove_traits::{Sink, SpiBus};
use std::time::{Duration, Instant};

use crate::calibration::Calibration;
use crate::config::ControlCfg;
use crate::control::{ControlValue, STOP_MESSAGE, control_value};
use crate::error::{Report, Result};
use crate::hw_error::map_sink_error;
use crate::sensor::read_sample;

/// Why the loop ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    TickLimit,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub reason: StopReason,
    /// Ticks whose control value was sent.
    pub ticks: u64,
    /// Timer periods that elapsed without being serviced.
    pub overruns: u64,
    pub last_value: Option<ControlValue>,
}

/// Channel pair for the shutdown request. The sender side is cheap to clone
/// and safe to call from a signal handler thread; extra requests are dropped.
pub fn shutdown_channel() -> (xch::Sender<()>, xch::Receiver<()>) {
    xch::bounded(1)
}

/// True once shutdown was requested or every sender is gone.
#[inline]
fn shutdown_pending(shutdown: &xch::Receiver<()>) -> bool {
    matches!(
        shutdown.try_recv(),
        Ok(()) | Err(xch::TryRecvError::Disconnected)
    )
}

/// Number of whole periods skipped between two serviced ticks.
#[inline]
fn skipped_periods(previous: Instant, now: Instant, period: Duration) -> u64 {
    let gap = now.saturating_duration_since(previous).as_nanos();
    let p = period.as_nanos().max(1);
    u64::try_from((gap / p).saturating_sub(1)).unwrap_or(u64::MAX)
}

pub struct ControlLoop<B, S> {
    pub(crate) bus: B,
    pub(crate) sink: S,
    pub(crate) calibration: Calibration,
    pub(crate) control: ControlCfg,
    pub(crate) max_ticks: Option<u64>,
    pub(crate) ticks: u64,
    pub(crate) overruns: u64,
    pub(crate) last_value: Option<ControlValue>,
}

impl<B, S> std::fmt::Debug for ControlLoop<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlLoop")
            .field("calibration", &self.calibration)
            .field("control", &self.control)
            .field("max_ticks", &self.max_ticks)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl<B: SpiBus, S: Sink> ControlLoop<B, S> {
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn control_cfg(&self) -> &ControlCfg {
        &self.control
    }

    /// Read one sample and compute its control value without sending it.
    pub fn sample(&mut self) -> Result<ControlValue> {
        let sample = read_sample(&mut self.bus).map_err(Report::new)?;
        let value = control_value(sample, &self.calibration, &self.control).map_err(Report::new)?;
        tracing::debug!(sample = sample.value(), value = value.value(), "tick");
        Ok(value)
    }

    /// Send one control value as a message.
    pub fn publish(&mut self, value: ControlValue) -> Result<()> {
        self.sink
            .send(&value.message())
            .map_err(|e| Report::new(map_sink_error(e.as_ref())))?;
        self.ticks += 1;
        self.last_value = Some(value);
        Ok(())
    }

    /// Send the stop message and close the sink.
    pub fn stop(&mut self) -> Result<()> {
        self.sink
            .send(STOP_MESSAGE)
            .map_err(|e| Report::new(map_sink_error(e.as_ref())))?;
        self.sink
            .close()
            .map_err(|e| Report::new(map_sink_error(e.as_ref())))?;
        tracing::info!(ticks = self.ticks, "stop message sent");
        Ok(())
    }

    fn finish(&mut self, reason: StopReason) -> Result<RunSummary> {
        self.stop()?;
        Ok(RunSummary {
            reason,
            ticks: self.ticks,
            overruns: self.overruns,
            last_value: self.last_value,
        })
    }

    /// Run until `shutdown` fires (or the tick limit is reached).
    ///
    /// Shutdown is observed between ticks and once more after each transfer,
    /// before that tick's message is written; an in-flight transfer is never
    /// interrupted.
    pub fn run(mut self, shutdown: &xch::Receiver<()>) -> Result<RunSummary> {
        let period = self.control.period;
        let ticker = xch::tick(period);
        let mut last_tick = Instant::now();
        tracing::info!(
            period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX),
            ceiling = self.control.ceiling,
            comfort_floor = self.control.comfort_floor,
            "control loop start"
        );

        loop {
            xch::select! {
                recv(shutdown) -> _ => {
                    tracing::info!("shutdown requested");
                    return self.finish(StopReason::Shutdown);
                }
                recv(ticker) -> at => {
                    // Both ready: shutdown wins.
                    if shutdown_pending(shutdown) {
                        tracing::info!("shutdown requested");
                        return self.finish(StopReason::Shutdown);
                    }
                    if let Ok(at) = at {
                        let skipped = skipped_periods(last_tick, at, period);
                        if skipped > 0 {
                            self.overruns = self.overruns.saturating_add(skipped);
                            tracing::warn!(skipped, "control loop overran its period");
                        }
                        last_tick = at;
                    }

                    let value = self.sample()?;
                    if shutdown_pending(shutdown) {
                        tracing::info!("shutdown requested during transfer; dropping tick");
                        return self.finish(StopReason::Shutdown);
                    }
                    self.publish(value)?;

                    if self.max_ticks.is_some_and(|max| self.ticks >= max) {
                        tracing::info!(ticks = self.ticks, "tick limit reached");
                        return self.finish(StopReason::TickLimit);
                    }
                }
            }
        }
    }
}
