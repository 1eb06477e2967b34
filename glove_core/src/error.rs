use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GloveError {
    #[error("device error: {0}")]
    Device(String),
    #[error("spi transfer failed: {0}")]
    Transport(String),
    #[error("sink error: {0}")]
    Sink(String),
    #[error("degenerate calibration: open and closed references are both {0}")]
    DegenerateCalibration(i64),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing spi bus")]
    MissingBus,
    #[error("missing sink")]
    MissingSink,
    #[error("missing calibration")]
    MissingCalibration,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
