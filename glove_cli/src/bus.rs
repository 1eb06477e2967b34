//! Bus selection: the spidev device with the `hardware` feature on Linux,
//! otherwise a simulated converter.

use glove_config::Config;
use glove_core::error::Result;
use glove_traits::SpiBus;

/// Reference readings the simulated glove reports during calibration.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
const SIM_OPEN: u16 = 900;
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
const SIM_CLOSED: u16 = 100;
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
const SIM_STEP: u16 = 40;

/// What `self-check` reports about the opened bus.
#[derive(Debug, Clone)]
pub struct BusReport {
    pub backend: &'static str,
    pub path: Option<String>,
    pub mode: u8,
    pub max_speed_hz: u32,
    pub bits_per_word: u8,
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn open(cfg: &Config) -> Result<(Box<dyn SpiBus>, BusReport)> {
    use glove_core::hw_error::map_hw_error;
    use glove_hardware::SpidevBus;

    let bus = SpidevBus::open(cfg.spi.channel, cfg.spi.max_speed_hz, cfg.spi.bits_per_word)
        .map_err(|e| eyre::Report::new(map_hw_error(&e)))?
        .with_legacy_error_masking(cfg.spi.legacy_mask_transfer_errors);
    let live = bus
        .read_back()
        .map_err(|e| eyre::Report::new(map_hw_error(&e)))?;
    if live != bus.config() {
        tracing::warn!(requested = ?bus.config(), reported = ?live, "spi: driver adjusted bus parameters");
    }
    let report = BusReport {
        backend: "spidev",
        path: Some(bus.path().display().to_string()),
        mode: live.mode.bits(),
        max_speed_hz: live.max_speed_hz,
        bits_per_word: live.bits_per_word,
    };
    tracing::info!(path = ?report.path, max_speed_hz = live.max_speed_hz, "spi: device ready");
    Ok((Box::new(bus), report))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn open(cfg: &Config) -> Result<(Box<dyn SpiBus>, BusReport)> {
    use glove_hardware::{BusConfig, SimulatedBus};

    let window = usize::try_from(cfg.calibration.window).unwrap_or(usize::MAX);
    let mut bus = SimulatedBus::new(SIM_OPEN, SIM_CLOSED, window, SIM_STEP);
    // Fault injection for integration tests.
    if let Some(n) = std::env::var("GLOVE_SIM_FAIL_AFTER")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
    {
        bus = bus.fail_after(n);
    }
    let resolved = BusConfig::resolve(cfg.spi.max_speed_hz, cfg.spi.bits_per_word);
    if cfg.spi.legacy_mask_transfer_errors {
        tracing::warn!("spi: legacy_mask_transfer_errors has no effect on the simulated bus");
    }
    tracing::info!("spi: using simulated bus");
    Ok((
        Box::new(bus),
        BusReport {
            backend: "simulated",
            path: None,
            mode: resolved.mode.bits(),
            max_speed_hz: resolved.max_speed_hz,
            bits_per_word: resolved.bits_per_word,
        },
    ))
}
