use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rom_core::jobs::CancellationToken;
use rom_core::processing::kinematics::{moving_average, stage_bins, velocity, AngleSummary};
use rom_core::processing::{measure, TimelineWindow, ViewPipeline, WeightedScorer, SideContribution};
use rom_core::source::simulator::{skeleton, SyntheticClip, SyntheticProviderFactory, SyntheticVideo, Trajectory};
use rom_core::source::{DetectionThresholds, KeypointSource, ProviderFactory, Side, View};
use std::sync::Arc;

const SERIES_LENGTHS: &[usize] = &[300, 1_800, 9_000];
const SMOOTHING_WINDOWS: &[usize] = &[3, 6, 15];

fn sweep(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| 90.0 + 80.0 * (i as f64 * 0.05).sin())
        .collect()
}

fn benchmark_series_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("series");

    for &len in SERIES_LENGTHS {
        let angles = sweep(len);
        group.throughput(Throughput::Elements(len as u64));

        group.bench_with_input(BenchmarkId::new("velocity", len), &angles, |b, angles| {
            b.iter(|| velocity(black_box(angles), 30.0));
        });

        group.bench_with_input(BenchmarkId::new("stage_bins", len), &angles, |b, angles| {
            let rates = velocity(angles, 30.0);
            b.iter(|| stage_bins(black_box(angles), black_box(&rates)));
        });

        group.bench_with_input(BenchmarkId::new("angle_summary", len), &angles, |b, angles| {
            b.iter(|| AngleSummary::from_series(black_box(angles), 30.0));
        });

        for &window in SMOOTHING_WINDOWS {
            group.bench_with_input(
                BenchmarkId::new("moving_average", format!("{}len_{}win", len, window)),
                &angles,
                |b, angles| {
                    b.iter(|| moving_average(black_box(angles), window));
                },
            );
        }
    }

    group.finish();
}

fn benchmark_geometry(c: &mut Criterion) {
    let mut group = c.benchmark_group("geometry");
    let subject = skeleton(75.0, 110.0);

    for view in View::ALL {
        group.bench_with_input(BenchmarkId::new("measure", view), &subject, |b, subject| {
            b.iter(|| measure(view, black_box(subject)));
        });
    }

    group.finish();
}

fn benchmark_view_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_pipeline");
    group.sample_size(20);

    for &frames in &[300u64, 1_800] {
        let clip = Arc::new(
            SyntheticClip::new(
                30.0,
                frames,
                Trajectory::Sinusoidal { center: 90.0, amplitude: 70.0, period_frames: 90.0 },
                Trajectory::Ramp { from: 10.0, to: 160.0 },
            )
            .with_noise(1.5, 7),
        );
        group.throughput(Throughput::Elements(frames));

        group.bench_with_input(BenchmarkId::new("front", frames), &clip, |b, clip| {
            let factory = SyntheticProviderFactory::new();
            b.iter(|| {
                let provider = factory.create().expect("synthetic provider");
                let mut source = KeypointSource::new(
                    provider,
                    DetectionThresholds { confidence: 0.25, overlap: 0.45, min_keypoint_confidence: 0.0 },
                );
                let mut video = SyntheticVideo::new(Arc::clone(clip));
                ViewPipeline::new(View::Front, TimelineWindow::full())
                    .run(&mut video, &mut source, &CancellationToken::new(), |_| {})
                    .expect("pipeline run")
            });
        });
    }

    group.finish();
}

fn benchmark_scoring(c: &mut Criterion) {
    let contributions: Vec<SideContribution> = [View::Front, View::Side]
        .into_iter()
        .flat_map(|view| {
            Side::BOTH.into_iter().map(move |side| SideContribution {
                view,
                side,
                max_angle: 150.0,
                max_velocity: 420.0,
            })
        })
        .collect();

    c.bench_function("weighted_score", |b| {
        b.iter(|| WeightedScorer::score(black_box(&contributions)));
    });
}

criterion_group!(
    benches,
    benchmark_series_derivation,
    benchmark_geometry,
    benchmark_view_pipeline,
    benchmark_scoring
);
criterion_main!(benches);
