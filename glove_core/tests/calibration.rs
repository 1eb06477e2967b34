use std::time::Duration;

use glove_core::mocks::ScriptedBus;
use glove_core::{CalibrationCfg, Calibrator, GloveError};
use glove_hardware::SimulatedBus;
use glove_traits::clock::test_clock::TestClock;

fn fast_cfg() -> CalibrationCfg {
    CalibrationCfg {
        window: 3,
        tick: Duration::from_millis(10),
        settle: Duration::from_millis(500),
    }
}

#[test]
fn last_sample_of_each_window_becomes_the_reference() {
    let mut bus = ScriptedBus::samples([11, 12, 900, 21, 22, 100]);
    let clock = TestClock::new();
    let cal = Calibrator::new(fast_cfg(), &clock)
        .calibrate(&mut bus)
        .expect("calibrate");

    assert_eq!(cal.open().value(), 900);
    assert_eq!(cal.closed().value(), 100);
    assert_eq!(bus.reads(), 6);
}

#[test]
fn phases_are_paced_by_the_clock() {
    let mut bus = ScriptedBus::samples([900, 900, 900, 100, 100, 100]);
    let clock = TestClock::new();
    Calibrator::new(fast_cfg(), &clock)
        .calibrate(&mut bus)
        .expect("calibrate");

    let settle = Duration::from_millis(500);
    let tick = Duration::from_millis(10);
    // Three capture ticks plus one settling tick per phase.
    let phase = [tick; 4];
    let mut want = vec![settle];
    want.extend(phase);
    want.push(settle);
    want.extend(phase);
    want.push(settle);
    assert_eq!(clock.sleeps(), want);
    assert_eq!(clock.elapsed(), Duration::from_millis(1580));
}

#[test]
fn read_error_aborts_calibration() {
    let mut bus = ScriptedBus::new([Ok(900), Err("EIO".to_string())]);
    let clock = TestClock::new();
    let err = Calibrator::new(fast_cfg(), &clock)
        .calibrate(&mut bus)
        .expect_err("second read fails");
    assert!(matches!(
        err.downcast_ref::<GloveError>(),
        Some(GloveError::Transport(_))
    ));
    assert_eq!(bus.reads(), 2);
}

#[test]
fn simulated_glove_calibrates_to_its_rest_positions() {
    let mut bus = SimulatedBus::new(900, 100, 3, 50);
    let clock = TestClock::new();
    let cal = Calibrator::new(fast_cfg(), &clock)
        .calibrate(&mut bus)
        .expect("calibrate");
    assert_eq!(cal.bounds(), (100, 900));
    cal.ensure_distinct().expect("distinct references");
}

#[test]
fn equal_references_are_returned_but_flagged() {
    let mut bus = ScriptedBus::samples([512; 6]);
    let clock = TestClock::new();
    let cal = Calibrator::new(fast_cfg(), &clock)
        .calibrate(&mut bus)
        .expect("calibrate");
    assert_eq!(
        cal.ensure_distinct(),
        Err(GloveError::DegenerateCalibration(512))
    );
}
