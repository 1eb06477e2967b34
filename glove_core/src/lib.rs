#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Bend-sensor control logic (hardware-agnostic).
//!
//! This crate turns raw 10-bit bend-sensor readings into a stream of control
//! values. All hardware interaction goes through `glove_traits::SpiBus`, and
//! all output goes through `glove_traits::Sink`.
//!
//! ## Architecture
//!
//! - **Sensor**: request framing and reply decoding (`sensor` module)
//! - **Calibration**: two-phase open/closed reference capture (`calibration` module)
//! - **Mapping**: integer linear interpolation (`mapping` module)
//! - **Control**: invert, map, ceiling, comfort floor (`control` module)
//! - **Runner**: fixed-period control loop with shutdown (`runner` module)
//!
//! ## Data flow
//!
//! ```text
//! SpiBus -> read_sample -> RawSample -> control_value -> ControlValue -> Sink
//!                                          ^
//!                                     Calibration
//! ```

pub mod builder;
pub mod calibration;
pub mod config;
pub mod control;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod mapping;
pub mod mocks;
pub mod runner;
pub mod sensor;

pub use builder::ControlLoopBuilder;
pub use calibration::{Calibration, Calibrator, Phase, PhaseState, Position};
pub use config::{CalibrationCfg, ControlCfg, OUTPUT_MAX, OUTPUT_MIN};
pub use control::{ControlValue, STOP_MESSAGE, control_value, map_sample, shape};
pub use error::{BuildError, GloveError, Report, Result};
pub use mapping::linear_map;
pub use runner::{ControlLoop, RunSummary, StopReason, shutdown_channel};
pub use sensor::{REQUEST, RawSample, read_sample};
