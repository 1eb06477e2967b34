//! Maps `Box<dyn Error>` from trait boundaries to typed `GloveError`.
//!
//! The traits in `glove_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our typed error enum, with an optional feature-gated path
//! for `glove_hardware::HwError` downcasting.

use crate::error::GloveError;

/// Map an error raised by an `SpiBus` implementation.
///
/// Known hardware errors are classified precisely; anything else is treated
/// as a failed transfer, since that is the only operation the trait exposes.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> GloveError {
    #[cfg(feature = "hardware-errors")]
    {
        use glove_hardware::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Open { .. } | HwError::Busy { .. } | HwError::Config { .. } => {
                    GloveError::Device(hw.to_string())
                }
                HwError::Transfer(_) | HwError::EmptyTransfer | HwError::TransferTooLong(_) => {
                    GloveError::Transport(hw.to_string())
                }
            };
        }
    }

    GloveError::Transport(e.to_string())
}

/// Map an error raised by a `Sink` implementation.
pub fn map_sink_error(e: &(dyn std::error::Error + 'static)) -> GloveError {
    GloveError::Sink(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untyped_bus_errors_are_transport_errors() {
        let e: Box<dyn std::error::Error + Send + Sync> = "ioctl EIO".into();
        assert_eq!(
            map_hw_error(e.as_ref()),
            GloveError::Transport("ioctl EIO".into())
        );
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn typed_hw_errors_are_classified() {
        use glove_hardware::HwError;
        let busy = HwError::Busy {
            path: "/dev/spidev0.0".into(),
        };
        assert!(matches!(map_hw_error(&busy), GloveError::Device(_)));
        let xfer = HwError::Transfer(std::io::Error::other("EIO"));
        assert!(matches!(map_hw_error(&xfer), GloveError::Transport(_)));
        assert!(matches!(
            map_hw_error(&HwError::EmptyTransfer),
            GloveError::Transport(_)
        ));
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn open_time_failures_are_device_errors() {
        use glove_hardware::HwError;
        let open = HwError::Open {
            path: "/dev/spidev0.1".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(matches!(map_hw_error(&open), GloveError::Device(_)));
        let config = HwError::Config {
            what: "mode",
            source: std::io::Error::other("ENOTTY"),
        };
        assert!(matches!(map_hw_error(&config), GloveError::Device(_)));
    }
}
