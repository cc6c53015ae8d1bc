// src/processing/pipeline.rs
//! Frame loop turning one video into a per-view sample sequence

use crate::error::{PipelineStage, RomError, RomErrorBuilder, RomResult};
use crate::jobs::cancel::CancellationToken;
use crate::processing::geometry;
use crate::processing::kinematics::{self, AngleSummary, WristSummary};
use crate::processing::windowing::{FrameSpan, TimelineWindow};
use crate::source::adapter::KeypointSource;
use crate::source::traits::{VideoError, VideoSource};
use crate::source::types::{Side, View};
use crate::error_context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Measurement taken on one analysed frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Absolute 0-based frame index in the source video
    pub frame: u64,
    /// 1-based position inside the timeline window
    pub relative_frame: u64,
    /// Seconds from the start of the video
    pub timestamp: f64,
    pub left: f64,
    pub right: f64,
}

impl Sample {
    pub fn value(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Derived rate attached to the later of the two samples it was computed from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSample {
    pub frame: u64,
    pub left: f64,
    pub right: f64,
}

impl RateSample {
    pub fn value(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Outcome of analysing one view. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewAnalysisResult {
    pub view: View,
    pub fps: f64,
    pub window: TimelineWindow,
    pub span: FrameSpan,
    pub total_frames: u64,
    pub samples: Vec<Sample>,
    pub velocity: Vec<RateSample>,
    pub acceleration: Vec<RateSample>,
    pub frames_read: u64,
    pub frames_skipped: u64,
}

// Upper bound on the up-front sample reservation; the header frame count is untrusted
const MAX_SAMPLE_RESERVE: u64 = 65_536;

fn rate_samples(frames: impl Iterator<Item = u64>, left: Vec<f64>, right: Vec<f64>) -> Vec<RateSample> {
    frames
        .zip(left)
        .zip(right)
        .map(|((frame, left), right)| RateSample { frame, left, right })
        .collect()
}

impl ViewAnalysisResult {
    /// Build a result from collected samples, deriving velocity and
    /// acceleration series
    pub fn from_samples(
        view: View,
        fps: f64,
        window: TimelineWindow,
        span: FrameSpan,
        total_frames: u64,
        samples: Vec<Sample>,
    ) -> Self {
        let side_values = |side: Side| samples.iter().map(|s| s.value(side)).collect::<Vec<_>>();
        let (left, right) = (side_values(Side::Left), side_values(Side::Right));
        let frames = samples.iter().map(|s| s.frame);
        let velocity = rate_samples(
            frames.clone().skip(1),
            kinematics::velocity(&left, fps),
            kinematics::velocity(&right, fps),
        );
        let acceleration = rate_samples(
            frames.skip(2),
            kinematics::acceleration(&left, fps),
            kinematics::acceleration(&right, fps),
        );
        let frames_read = samples.len() as u64;

        Self {
            view,
            fps,
            window,
            span,
            total_frames,
            samples,
            velocity,
            acceleration,
            frames_read,
            frames_skipped: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn values(&self, side: Side) -> Vec<f64> {
        self.samples.iter().map(|s| s.value(side)).collect()
    }

    pub fn velocities(&self, side: Side) -> Vec<f64> {
        self.velocity.iter().map(|r| r.value(side)).collect()
    }

    pub fn accelerations(&self, side: Side) -> Vec<f64> {
        self.acceleration.iter().map(|r| r.value(side)).collect()
    }

    /// Smoothed metric series for charts
    pub fn smoothed(&self, side: Side, window: usize) -> Vec<f64> {
        kinematics::moving_average(&self.values(side), window)
    }

    /// Angle summary for front/side views; `None` for the back view or an
    /// empty sequence
    pub fn angle_summary(&self, side: Side) -> Option<AngleSummary> {
        if !self.view.metric().is_angle() {
            return None;
        }
        AngleSummary::from_derived(&self.values(side), &self.velocities(side), &self.accelerations(side))
    }

    /// Wrist summary for the back view
    pub fn wrist_summary(&self, side: Side) -> Option<WristSummary> {
        if self.view.metric().is_angle() {
            return None;
        }
        WristSummary::from_series(&self.values(side), self.fps)
    }
}

/// Progress notification emitted by the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewProgress {
    pub view: View,
    pub frames_processed: u64,
    pub frames_total: u64,
}

/// Runs the per-frame extraction for one view
#[derive(Debug, Clone)]
pub struct ViewPipeline {
    view: View,
    window: TimelineWindow,
    progress_interval: u64,
}

impl ViewPipeline {
    pub fn new(view: View, window: TimelineWindow) -> Self {
        Self {
            view,
            window,
            progress_interval: 10,
        }
    }

    /// Report progress every `frames` frames (at least one)
    pub fn with_progress_interval(mut self, frames: u64) -> Self {
        self.progress_interval = frames.max(1);
        self
    }

    /// Decode the window of `video`, detect keypoints and measure every frame.
    ///
    /// Frames that fail to decode, show nobody or lack required keypoints are
    /// skipped. The cancellation token is checked before every frame; a
    /// cancelled run returns [`RomError::Cancelled`] and no partial result.
    pub fn run<F>(
        &self,
        video: &mut dyn VideoSource,
        source: &mut KeypointSource,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> RomResult<ViewAnalysisResult>
    where
        F: FnMut(ViewProgress),
    {
        let fps = video.fps();
        if !fps.is_finite() || fps <= 0.0 {
            return Err(RomErrorBuilder::new("view_pipeline", "run")
                .invalid_data("frame rate", &format!("{} video reports {} fps", self.view, fps)));
        }
        let total_frames = video.frame_count();
        let span = self.window.frame_span(fps, total_frames);

        video.seek(span.start).map_err(|e| self.decode_error(span.start, e))?;
        info!(view = %self.view, start = span.start, end = span.end, fps, "view analysis started");

        let mut samples = Vec::with_capacity(span.len().min(MAX_SAMPLE_RESERVE) as usize);
        let mut frames_read = 0u64;
        let mut frames_skipped = 0u64;

        for absolute in span.start..span.end {
            cancel.checkpoint(PipelineStage::Frame)?;

            let frame = match video.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    debug!(view = %self.view, frame = absolute, error = %e, "frame skipped: decode failure");
                    frames_read += 1;
                    frames_skipped += 1;
                    self.report_progress(frames_read, span, &mut on_progress);
                    continue;
                }
            };
            frames_read += 1;

            let measured = match source.detect(&frame) {
                Ok(Some(subject)) => geometry::measure(self.view, &subject),
                Ok(None) => None,
                Err(e) => {
                    debug!(view = %self.view, frame = absolute, error = %e, "frame skipped: inference failure");
                    None
                }
            };

            match measured {
                Some(values) => samples.push(Sample {
                    frame: absolute,
                    relative_frame: self.window.relative_frame(absolute, fps),
                    timestamp: absolute as f64 / fps,
                    left: values.left,
                    right: values.right,
                }),
                None => {
                    debug!(view = %self.view, frame = absolute, "frame skipped: no usable subject");
                    frames_skipped += 1;
                }
            }

            self.report_progress(frames_read, span, &mut on_progress);
        }

        let mut result = ViewAnalysisResult::from_samples(self.view, fps, self.window, span, total_frames, samples);
        result.frames_read = frames_read;
        result.frames_skipped = frames_skipped;

        info!(
            view = %self.view,
            samples = result.samples.len(),
            skipped = frames_skipped,
            "view analysis finished"
        );
        Ok(result)
    }

    fn report_progress<F: FnMut(ViewProgress)>(&self, processed: u64, span: FrameSpan, on_progress: &mut F) {
        if processed % self.progress_interval == 0 || processed == span.len() {
            on_progress(ViewProgress {
                view: self.view,
                frames_processed: processed,
                frames_total: span.len(),
            });
        }
    }

    fn decode_error(&self, frame: u64, err: VideoError) -> RomError {
        RomError::FrameDecode {
            view: self.view,
            frame,
            reason: err.to_string(),
            context: error_context!("view_pipeline", "seek"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::adapter::DetectionThresholds;
    use crate::source::simulator::{SyntheticClip, SyntheticProviderFactory, SyntheticVideo};
    use crate::source::traits::ProviderFactory;
    use std::sync::Arc;

    fn keypoint_source() -> KeypointSource {
        let provider = SyntheticProviderFactory::new().create().unwrap();
        KeypointSource::new(
            provider,
            DetectionThresholds {
                confidence: 0.25,
                overlap: 0.45,
                min_keypoint_confidence: 0.3,
            },
        )
    }

    fn run_clip(clip: SyntheticClip, view: View, window: TimelineWindow) -> RomResult<ViewAnalysisResult> {
        let mut video = SyntheticVideo::new(Arc::new(clip));
        let mut source = keypoint_source();
        ViewPipeline::new(view, window).run(&mut video, &mut source, &CancellationToken::new(), |_| {})
    }

    #[test]
    fn test_scenario_series() {
        let values = [10.0, 15.0, 25.0, 40.0, 60.0, 80.0, 95.0, 110.0, 120.0, 125.0];
        let result = run_clip(SyntheticClip::from_samples(30.0, &values), View::Front, TimelineWindow::full()).unwrap();

        assert_eq!(result.samples.len(), 10);
        assert_eq!(result.velocity.len(), 9);
        assert_eq!(result.acceleration.len(), 8);
        assert!((result.velocities(Side::Left)[0] - 150.0).abs() < 1e-6);
        assert_eq!(result.velocity[0].frame, 1);

        let summary = result.angle_summary(Side::Left).unwrap();
        assert!((summary.velocity_stages[2] - 300.0).abs() < 1e-6);
        assert!(result.wrist_summary(Side::Left).is_none());
    }

    #[test]
    fn test_rate_series_follow_kinematics() {
        let samples: Vec<Sample> = [(0, 10.0, 20.0), (2, 40.0, 25.0), (3, 90.0, 45.0), (7, 100.0, 30.0)]
            .into_iter()
            .enumerate()
            .map(|(i, (frame, left, right))| Sample {
                frame,
                relative_frame: i as u64 + 1,
                timestamp: frame as f64 / 30.0,
                left,
                right,
            })
            .collect();
        let result = ViewAnalysisResult::from_samples(
            View::Side,
            30.0,
            TimelineWindow::full(),
            FrameSpan { start: 0, end: 8 },
            8,
            samples,
        );

        for side in Side::BOTH {
            let values = result.values(side);
            assert_eq!(result.velocities(side), kinematics::velocity(&values, 30.0));
            assert_eq!(result.accelerations(side), kinematics::acceleration(&values, 30.0));
            assert_eq!(result.angle_summary(side), AngleSummary::from_series(&values, 30.0));
        }
        let frames = |rates: &[RateSample]| rates.iter().map(|r| r.frame).collect::<Vec<_>>();
        assert_eq!(frames(&result.velocity), vec![2, 3, 7]);
        assert_eq!(frames(&result.acceleration), vec![3, 7]);
    }

    struct OverstatedVideo(SyntheticVideo);

    impl VideoSource for OverstatedVideo {
        fn fps(&self) -> f64 {
            self.0.fps()
        }

        fn frame_count(&self) -> u64 {
            u64::MAX / 2
        }

        fn seek(&mut self, index: u64) -> Result<(), VideoError> {
            self.0.seek(index)
        }

        fn read_frame(&mut self) -> Result<Option<crate::source::types::Frame>, VideoError> {
            self.0.read_frame()
        }
    }

    #[test]
    fn test_overstated_frame_count_stops_at_end_of_stream() {
        let clip = SyntheticClip::from_samples(30.0, &[10.0, 20.0, 30.0]);
        let mut video = OverstatedVideo(SyntheticVideo::new(Arc::new(clip)));
        let mut source = keypoint_source();

        let result = ViewPipeline::new(View::Front, TimelineWindow::full())
            .run(&mut video, &mut source, &CancellationToken::new(), |_| {})
            .unwrap();
        assert_eq!(result.samples.len(), 3);
        assert_eq!(result.frames_read, 3);
    }

    #[test]
    fn test_skipped_frames_are_not_sampled() {
        let clip = SyntheticClip::from_samples(30.0, &[10.0, 20.0, 30.0, 40.0, 50.0])
            .with_decode_failures([1])
            .with_undetected([3]);
        let result = run_clip(clip, View::Side, TimelineWindow::full()).unwrap();

        let frames: Vec<u64> = result.samples.iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![0, 2, 4]);
        assert_eq!(result.frames_read, 5);
        assert_eq!(result.frames_skipped, 2);
    }

    #[test]
    fn test_window_restricts_frames() {
        let values: Vec<f64> = (0..60).map(|i| i as f64).collect();
        let result = run_clip(
            SyntheticClip::from_samples(30.0, &values),
            View::Front,
            TimelineWindow::new(1.0, Some(1.5)),
        )
        .unwrap();

        assert_eq!(result.samples.first().map(|s| (s.frame, s.relative_frame)), Some((30, 1)));
        assert_eq!(result.samples.last().map(|s| s.frame), Some(44));
    }

    #[test]
    fn test_back_view_ratios() {
        let clip = SyntheticClip::from_samples(10.0, &[0.2, 0.6, 1.0]);
        let result = run_clip(clip, View::Back, TimelineWindow::full()).unwrap();
        let wrist = result.wrist_summary(Side::Right).unwrap();
        assert!((wrist.max_height - 1.0).abs() < 1e-9);
        assert!(result.angle_summary(Side::Right).is_none());
    }

    #[test]
    fn test_cancelled_before_first_frame() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut video = SyntheticVideo::new(Arc::new(SyntheticClip::from_samples(30.0, &[1.0, 2.0])));
        let mut source = keypoint_source();

        let err = ViewPipeline::new(View::Front, TimelineWindow::full())
            .run(&mut video, &mut source, &cancel, |_| {})
            .unwrap_err();
        assert!(err.is_cancellation());
        assert_eq!(source.frames_inferred(), 0);
    }

    #[test]
    fn test_progress_reported_at_end() {
        let mut video = SyntheticVideo::new(Arc::new(SyntheticClip::from_samples(30.0, &[1.0; 25])));
        let mut source = keypoint_source();
        let mut reports = Vec::new();

        ViewPipeline::new(View::Front, TimelineWindow::full())
            .with_progress_interval(10)
            .run(&mut video, &mut source, &CancellationToken::new(), |p| reports.push(p.frames_processed))
            .unwrap();
        assert_eq!(reports, vec![10, 20, 25]);
    }
}
