use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is busy (held by another process)")]
    Busy { path: String },
    #[error("spi configure {what}: {source}")]
    Config {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("spi transfer with empty buffer")]
    EmptyTransfer,
    #[error("spi transfer of {0} bytes does not fit a single descriptor")]
    TransferTooLong(usize),
    #[error("spi transfer failed: {0}")]
    Transfer(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
