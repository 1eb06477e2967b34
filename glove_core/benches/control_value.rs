use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use glove_core::{Calibration, ControlCfg, RawSample, control_value};

// Triangle sweep across the full 10-bit range
fn sweep(n: usize) -> Vec<RawSample> {
    (0..n)
        .map(|i| {
            let phase = (i % 2046) as u16;
            let v = if phase <= 1023 { phase } else { 2046 - phase };
            RawSample::from_payload((v >> 8) as u8, (v & 0xFF) as u8)
        })
        .collect()
}

pub fn bench_control_value(c: &mut Criterion) {
    let mut g = c.benchmark_group("control_value");
    // Allow quick tweaking without CLI flags (Criterion 0.5):
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p glove_core --bench control_value
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(n) = ss.parse::<usize>() {
            g.sample_size(n.max(1));
        }
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let samples = sweep(50_000);
    let cal = Calibration::new(
        RawSample::from_payload(0x03, 0x84), // 900
        RawSample::from_payload(0x00, 0x64), // 100
    );

    for &ceiling in &[99i64, 60] {
        let cfg = ControlCfg {
            ceiling,
            ..ControlCfg::default()
        };
        g.bench_function(format!("ceiling_{ceiling}"), |b| {
            b.iter_batched(
                || samples.clone(),
                |s| {
                    let mut acc = 0u64;
                    for &x in &s {
                        if let Ok(v) = control_value(black_box(x), &cal, &cfg) {
                            acc += u64::from(v.value());
                        }
                    }
                    black_box(acc);
                },
                BatchSize::SmallInput,
            )
        });
    }
    g.finish();
}

criterion_group!(control, bench_control_value);
criterion_main!(control);
