// tests/pipeline_scenarios.rs
//! Single-view pipeline runs over scripted clips

use rom_core::jobs::CancellationToken;
use rom_core::processing::{select_keyframes, TimelineWindow, ViewAnalysisResult, ViewPipeline};
use rom_core::source::simulator::{SyntheticClip, SyntheticProviderFactory, SyntheticVideo, Trajectory};
use rom_core::source::{DetectionThresholds, KeypointSource, ProviderFactory, Side, View};
use rom_core::RomError;
use std::sync::Arc;

const SCENARIO: [f64; 10] = [10.0, 15.0, 25.0, 40.0, 60.0, 80.0, 95.0, 110.0, 120.0, 125.0];
const EPS: f64 = 1e-6;

fn keypoint_source() -> KeypointSource {
    let provider = SyntheticProviderFactory::new().create().unwrap();
    KeypointSource::new(
        provider,
        DetectionThresholds {
            confidence: 0.25,
            overlap: 0.45,
            min_keypoint_confidence: 0.0,
        },
    )
}

fn run(view: View, clip: SyntheticClip, window: TimelineWindow) -> Result<ViewAnalysisResult, RomError> {
    let mut video = SyntheticVideo::new(Arc::new(clip));
    let mut source = keypoint_source();
    ViewPipeline::new(view, window).run(&mut video, &mut source, &CancellationToken::new(), |_| {})
}

#[test]
fn test_front_view_scenario_velocity_and_stage_bins() {
    let result = run(View::Front, SyntheticClip::from_samples(30.0, &SCENARIO), TimelineWindow::full()).unwrap();

    assert_eq!(result.samples.len(), 10);
    let velocity = result.velocities(Side::Left);
    assert_eq!(velocity.len(), 9);
    assert!((velocity[0] - 150.0).abs() < EPS);

    let summary = result.angle_summary(Side::Left).unwrap();
    assert!((summary.max_angle - 125.0).abs() < EPS);
    // Angles 95, 110, 120 pair with velocities 450, 300, 150; 125 has none
    assert!((summary.velocity_stages[2] - 300.0).abs() < EPS);
    assert!((summary.max_velocity - 600.0).abs() < EPS);
    assert!(result.wrist_summary(Side::Left).is_none());
}

#[test]
fn test_back_view_reports_wrist_ratios() {
    let ratios = [0.1, 0.2, 0.4, 0.6, 0.5, 0.7];
    let result = run(View::Back, SyntheticClip::from_samples(30.0, &ratios), TimelineWindow::full()).unwrap();

    let wrist = result.wrist_summary(Side::Right).unwrap();
    assert!((wrist.max_height - 0.7).abs() < EPS);
    assert!((wrist.min_height - 0.5).abs() < EPS);
    assert!(result.angle_summary(Side::Right).is_none());

    let keyframes = select_keyframes(&result, Side::Left);
    assert_eq!(keyframes.len(), 2);
    assert!(keyframes.iter().all(|k| k.frame == 5));
}

#[test]
fn test_timeline_window_limits_frames() {
    let clip = SyntheticClip::new(10.0, 40, Trajectory::Ramp { from: 0.0, to: 39.0 }, Trajectory::Constant(30.0));
    let result = run(View::Front, clip, TimelineWindow::new(1.0, Some(2.0))).unwrap();

    assert_eq!(result.samples.len(), 10);
    assert_eq!(result.samples[0].frame, 10);
    assert_eq!(result.samples[0].relative_frame, 1);
    assert!((result.samples[0].timestamp - 1.0).abs() < EPS);

    let peak = select_keyframes(&result, Side::Left)
        .into_iter()
        .find(|k| k.side == Side::Left)
        .unwrap();
    assert_eq!(peak.frame, 19);
    assert!((peak.value - 19.0).abs() < EPS);
}

#[test]
fn test_zero_fps_is_rejected() {
    let err = run(View::Front, SyntheticClip::from_samples(0.0, &SCENARIO), TimelineWindow::full()).unwrap_err();
    assert!(matches!(err, RomError::InvalidData { .. }));
}
