#![no_main]
use glove_core::{Calibration, ControlCfg, RawSample, control_value};
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    open: [u8; 2],
    closed: [u8; 2],
    reply: [u8; 2],
    ceiling: u8,
    comfort_floor: u8,
}

fuzz_target!(|input: Input| {
    let open = RawSample::from_payload(input.open[0], input.open[1]);
    let closed = RawSample::from_payload(input.closed[0], input.closed[1]);
    let sample = RawSample::from_payload(input.reply[0], input.reply[1]);
    let ceiling = i64::from(input.ceiling % 100);
    let cfg = ControlCfg {
        ceiling,
        comfort_floor: i64::from(input.comfort_floor) % (ceiling + 1),
        ..ControlCfg::default()
    };
    match control_value(sample, &Calibration::new(open, closed), &cfg) {
        Ok(v) => {
            assert!(i64::from(v.value()) <= ceiling);
            assert!(v.value() == 0 || i64::from(v.value()) >= cfg.comfort_floor);
        }
        Err(_) => assert_eq!(open, closed),
    }
});
