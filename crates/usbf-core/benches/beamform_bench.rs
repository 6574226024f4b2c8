//! Benchmarks for the beamforming kernel and full-image reconstruction
//!
//! Run with: cargo bench -p usbf-core --bench beamform_bench
//! Parallel backend: cargo bench -p usbf-core --bench beamform_bench --features parallel

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use usbf_core::apodization::ExpandingAperture;
use usbf_core::backend::Backend;
use usbf_core::prelude::*;
use usbf_core::Summation;

const FS: f64 = 40e6;
const SAMPLES: usize = 1200;

fn setup() -> (Simulator, Vec<ElementGeometry>, Vec<WaveData>, Tensor) {
    let simulator = Simulator::new(GaussianPulse::default(), FS, SAMPLES);
    let receivers: Vec<ElementGeometry> = linspace(-0.006, 0.006, 32)
        .into_iter()
        .map(|x| ElementGeometry::new(Vec3::new(x, 0.0, 0.0)))
        .collect();
    let waves: Vec<WaveData> = linspace(-0.1, 0.1, 3).into_iter().map(|a| WaveData::plane(a, 0.0)).collect();
    let senders = vec![ElementGeometry::new(Vec3::ZERO)];
    let scatterers = [PointScatterer::new(Vec3::new(0.0, 0.0, 0.012))];
    let signal = simulator
        .simulate(&scatterers, &senders, &receivers, &waves)
        .expect("simulation");
    (simulator, receivers, waves, signal)
}

fn kernel(simulator: &Simulator) -> Kernel {
    Kernel::new(Arc::new(PlaneWavefront), Arc::new(simulator.time_axis()))
        .with_apodization(Arc::new(ExpandingAperture::new(Window::hanning(), 1.0)))
}

// ============================================================================
// Kernel Benchmarks
// ============================================================================

fn bench_interpolation(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpolation");
    let space = FastInterpLinspace::new(0.0, 1.0 / FS, SAMPLES);
    let signal = Tensor::from_vec((0..SAMPLES).map(|i| (i as f64 * 0.1).sin()).collect());

    group.bench_function("linear_sample", |b| {
        b.iter(|| space.interpolate(black_box(12.34e-6), &signal))
    });

    group.finish();
}

fn bench_signal_for_point(c: &mut Criterion) {
    let (simulator, receivers, waves, signal) = setup();
    let k = kernel(&simulator);
    let rf = signal.index_axis(0, 1).and_then(|t| t.index_axis(0, 16)).expect("channel");
    let sender = ElementGeometry::new(Vec3::ZERO);

    c.bench_function("signal_for_point", |b| {
        b.iter(|| {
            k.signal_for_point(
                &sender,
                black_box(Vec3::new(0.001, 0.0, 0.012)),
                &receivers[16],
                &waves[1],
                &rf,
            )
        })
    });
}

// ============================================================================
// Full Image Benchmarks
// ============================================================================

fn bench_beamform(c: &mut Criterion) {
    let mut group = c.benchmark_group("beamform");
    group.sample_size(10);

    let (simulator, receivers, waves, signal) = setup();
    let senders = vec![ElementGeometry::new(Vec3::ZERO)];

    let mut backends: Vec<(&str, Arc<dyn Backend>)> = vec![("sequential", Arc::new(Sequential))];
    #[cfg(feature = "parallel")]
    backends.push(("parallel", Arc::new(usbf_core::Parallel)));

    for n in [16usize, 32] {
        let scan = LinearScan::new(linspace(-0.004, 0.004, n), linspace(0.008, 0.016, n)).expect("scan");
        let data = BeamformerData::new(scan.points(), senders.clone(), receivers.clone(), waves.clone(), signal.clone())
            .expect("data");
        group.throughput(Throughput::Elements((n * n) as u64));

        for summation in [Summation::Vectorized, Summation::Folded] {
            let beamformer = Beamformer::for_scan(kernel(&simulator), &scan).with_summation(summation, summation);
            for (name, backend) in &backends {
                let id = format!("{name}/{summation:?}");
                group.bench_with_input(BenchmarkId::new(id, n), &n, |b, _| {
                    b.iter(|| beamformer.run(backend.as_ref(), &data))
                });
            }
        }
    }

    group.finish();
}

criterion_group!(kernel_benches, bench_interpolation, bench_signal_for_point);
criterion_group!(image_benches, bench_beamform);
criterion_main!(kernel_benches, image_benches);
