//! Human-readable error descriptions and structured JSON error formatting.

use glove_core::error::{BuildError, GloveError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingBus => {
                "What happened: No SPI bus was provided to the control loop.\nLikely causes: The sensor bus failed to open or was not wired into the builder.\nHow to fix: Ensure the bus is opened successfully and passed via with_bus(...).".to_string()
            }
            BuildError::MissingSink => {
                "What happened: No output sink was provided to the control loop.\nLikely causes: The consumer connection failed or was not wired into the builder.\nHow to fix: Ensure the sink connects and is passed via with_sink(...).".to_string()
            }
            BuildError::MissingCalibration => {
                "What happened: The control loop was started without calibration.\nLikely causes: Calibration did not run before the loop was built.\nHow to fix: Run calibration first and pass the result via with_calibration(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or flags, then rerun."
            ),
        };
    }

    if let Some(ge) = err.downcast_ref::<GloveError>() {
        return match ge {
            GloveError::Device(msg) => format!(
                "What happened: The SPI device could not be used ({msg}).\nLikely causes: SPI not enabled, wrong spi.channel, insufficient permissions on /dev/spidev*, or another process holding the device.\nHow to fix: Enable SPI, check the channel and device permissions, and stop any other program using the bus."
            ),
            GloveError::Transport(msg) => format!(
                "What happened: An SPI transfer failed ({msg}).\nLikely causes: Loose wiring to the converter, bus speed too high, or a driver fault.\nHow to fix: Check the sensor wiring and power, and try a lower spi.max_speed_hz."
            ),
            GloveError::Sink(msg) => format!(
                "What happened: Control values could not be delivered ({msg}).\nLikely causes: The consumer is not running, or the host, port or endpoint is wrong.\nHow to fix: Start the consumer and check [sink] in the config or the --host/--port/--endpoint flags."
            ),
            GloveError::DegenerateCalibration(v) => format!(
                "What happened: Calibration captured the same reading ({v}) for open and closed.\nLikely causes: The glove was not moved between phases, or the sensor is disconnected.\nHow to fix: Rerun and fully open, then fully close the hand when prompted."
            ),
            GloveError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: A malformed TOML file or an out-of-range value.\nHow to fix: Edit the config file or flags, then rerun."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable machine-readable name of the error class.
pub fn error_kind(err: &eyre::Report) -> &'static str {
    if let Some(ge) = err.downcast_ref::<GloveError>() {
        return match ge {
            GloveError::Device(_) => "Device",
            GloveError::Transport(_) => "Transport",
            GloveError::Sink(_) => "Sink",
            GloveError::DegenerateCalibration(_) => "DegenerateCalibration",
            GloveError::Config(_) => "Config",
        };
    }
    if let Some(BuildError::InvalidConfig(_)) = err.downcast_ref::<BuildError>() {
        return "Config";
    }
    "Error"
}

/// Map the error class to a stable exit code; unclassified errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match error_kind(err) {
        "Device" => 2,
        "Transport" => 3,
        "Sink" => 4,
        "DegenerateCalibration" => 5,
        "Config" => 6,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({ "reason": error_kind(err), "message": humanize(err) });
    if let Some(GloveError::DegenerateCalibration(v)) = err.downcast_ref::<GloveError>() {
        obj["details"] = json!({ "reference": v });
    }
    obj.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(GloveError::Device("busy".into()), 2)]
    #[case(GloveError::Transport("EIO".into()), 3)]
    #[case(GloveError::Sink("reset".into()), 4)]
    #[case(GloveError::DegenerateCalibration(512), 5)]
    #[case(GloveError::Config("bad".into()), 6)]
    fn exit_codes_are_stable(#[case] e: GloveError, #[case] code: i32) {
        assert_eq!(exit_code_for_error(&eyre::Report::new(e)), code);
    }

    #[test]
    fn invalid_build_config_is_a_config_error() {
        let err = eyre::Report::new(BuildError::InvalidConfig("period must be > 0"));
        assert_eq!(exit_code_for_error(&err), 6);
        assert!(humanize(&err).contains("period must be > 0"));
    }

    #[test]
    fn untyped_errors_fall_back_to_generic_text() {
        let err = eyre::eyre!("boom");
        assert_eq!(exit_code_for_error(&err), 1);
        assert!(humanize(&err).starts_with("Something went wrong."));
    }

    #[test]
    fn json_error_carries_reason_and_details() {
        let err = eyre::Report::new(GloveError::DegenerateCalibration(300));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).expect("json");
        assert_eq!(v["reason"], "DegenerateCalibration");
        assert_eq!(v["details"]["reference"], 300);
        assert!(
            v["message"]
                .as_str()
                .is_some_and(|m| m.starts_with("What happened:"))
        );
    }
}
