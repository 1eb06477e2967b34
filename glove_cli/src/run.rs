//! Command implementations: calibrate, connect, and drive the control loop.

use glove_config::Config;
use glove_core::error::{Report, Result};
use glove_core::{Calibration, Calibrator, ControlLoop, RunSummary, shutdown_channel};
use glove_traits::{MonotonicClock, Sink, SpiBus};

use crate::bus;
use crate::cli::SinkKind;
use crate::sink::{StdoutSink, WsSink};

/// Run both calibration phases on `bus`, pacing on the wall clock.
pub fn calibrate(cfg: &Config, bus: &mut dyn SpiBus) -> Result<Calibration> {
    Calibrator::new((&cfg.calibration).into(), MonotonicClock::new()).calibrate(bus)
}

fn connect(cfg: &Config, kind: SinkKind) -> Result<Box<dyn Sink>> {
    let sink: Box<dyn Sink> = match kind {
        SinkKind::Ws => Box::new(WsSink::connect(&cfg.sink).map_err(Report::new)?),
        SinkKind::Stdout => Box::new(StdoutSink::new()),
    };
    Ok(sink)
}

/// Calibrate, connect the sink, then poll until SIGINT/SIGTERM or the tick
/// limit. Signals before the loop starts terminate the process as usual.
pub fn run(cfg: &Config, sink_kind: SinkKind, max_ticks: Option<u64>) -> Result<RunSummary> {
    let (mut bus, _) = bus::open(cfg)?;
    let calibration = calibrate(cfg, bus.as_mut())?;
    calibration.ensure_distinct().map_err(Report::new)?;

    let sink = connect(cfg, sink_kind)?;

    let (tx, rx) = shutdown_channel();
    ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    })
    .map_err(|e| eyre::eyre!("install signal handler: {e}"))?;

    let control_loop = ControlLoop::builder()
        .with_bus(bus)
        .with_sink(sink)
        .with_calibration(calibration)
        .with_control((&cfg.control).into())
        .with_max_ticks(max_ticks)
        .try_build()?;
    let summary = control_loop.run(&rx)?;
    tracing::info!(
        reason = ?summary.reason,
        ticks = summary.ticks,
        overruns = summary.overruns,
        "run complete"
    );
    Ok(summary)
}

/// Outcome of `self-check`.
#[derive(Debug)]
pub struct SelfCheck {
    pub bus: bus::BusReport,
    pub sample: u16,
}

/// Open the bus and read one sample.
pub fn self_check(cfg: &Config) -> Result<SelfCheck> {
    let (mut bus, report) = bus::open(cfg)?;
    let sample = glove_core::read_sample(bus.as_mut()).map_err(Report::new)?;
    Ok(SelfCheck {
        bus: report,
        sample: sample.value(),
    })
}
