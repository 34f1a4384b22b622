//! # Noise Bank Benchmark
//!
//! Compares the per-cycle cost of the noise bank modes at the production
//! batch shape.

use criterion::{criterion_group, criterion_main, Criterion};

use mppi_lib::batch::{ControlBatch, ControlSequence};
use mppi_lib::noise_bank::{NoiseBank, NoiseMode, NoiseParams, SamplingStd};

const BATCH_SIZE: usize = 2000;
const TIME_STEPS: usize = 56;

fn noise_bank_benchmark(c: &mut Criterion) {
    let mut sequence = ControlSequence::default();
    sequence.reset(TIME_STEPS);
    let mut controls = ControlBatch::default();
    controls.reset(BATCH_SIZE, TIME_STEPS);

    // ---- On-demand: full synchronous redraw per cycle ----

    let on_demand = NoiseBank::new(
        &NoiseParams {
            mode: NoiseMode::OnDemand,
            seed: 42,
            ..Default::default()
        },
        SamplingStd::default(),
        BATCH_SIZE,
        TIME_STEPS,
        false,
    )
    .unwrap();

    c.bench_function("NoiseBank::on_demand_cycle", |b| {
        b.iter(|| {
            on_demand
                .apply_noised_controls(&sequence, &mut controls)
                .unwrap();
            on_demand.signal_regenerate().unwrap();
        })
    });

    // ---- Pre-generated: index advance plus copy per cycle ----

    let pregenerated = NoiseBank::new(
        &NoiseParams {
            mode: NoiseMode::Pregenerated,
            seed: 42,
            pregenerate_size: 100,
            ..Default::default()
        },
        SamplingStd::default(),
        BATCH_SIZE,
        TIME_STEPS,
        false,
    )
    .unwrap();

    c.bench_function("NoiseBank::pregenerated_cycle", |b| {
        b.iter(|| {
            pregenerated
                .apply_noised_controls(&sequence, &mut controls)
                .unwrap();
            pregenerated.signal_regenerate().unwrap();
        })
    });
}

criterion_group!(benches, noise_bank_benchmark);
criterion_main!(benches);
