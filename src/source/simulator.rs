// src/source/simulator.rs
//! Deterministic synthetic video source and keypoint provider
//!
//! A [`SyntheticClip`] scripts the per-frame ground truth (left/right metric
//! values) of one recording. [`SyntheticVideo`] paints that ground truth into
//! the header bytes of every frame it decodes, and [`SyntheticProvider`] reads
//! it back and lays out a skeleton whose shoulder angles and wrist height
//! ratios equal the scripted values. The same skeleton therefore serves the
//! front, side and back views.
//!
//! Frame header layout (little endian):
//! - bytes `0..8`: left value (`f64`)
//! - bytes `8..16`: right value (`f64`)
//! - byte `16`: `1` when a subject is visible, `0` otherwise

use crate::source::traits::{
    KeypointProvider, ProviderError, ProviderFactory, VideoError, VideoOpener, VideoSource,
};
use crate::source::types::{DetectedSubject, Frame, Keypoint, KeypointName, Side};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const FRAME_WIDTH: u32 = 8;
const FRAME_HEIGHT: u32 = 8;
const HEADER_LEN: usize = 17;

// Skeleton geometry in image coordinates (y grows downwards)
const SHOULDER_Y: f64 = 300.0;
const HIP_Y: f64 = 500.0;
const LEFT_X: f64 = 400.0;
const RIGHT_X: f64 = 600.0;
const UPPER_ARM_LENGTH: f64 = 80.0;
const LANDMARK_CONFIDENCE: f64 = 0.9;

/// Per-frame value generator
#[derive(Debug, Clone, PartialEq)]
pub enum Trajectory {
    Constant(f64),
    /// Linear sweep across the whole clip
    Ramp { from: f64, to: f64 },
    Sinusoidal { center: f64, amplitude: f64, period_frames: f64 },
    /// Explicit values; frames past the end repeat the last value
    Samples(Vec<f64>),
}

impl Trajectory {
    pub fn value_at(&self, frame: u64, frame_count: u64) -> f64 {
        match self {
            Trajectory::Constant(v) => *v,
            Trajectory::Ramp { from, to } => {
                if frame_count <= 1 {
                    return *from;
                }
                let t = frame as f64 / (frame_count - 1) as f64;
                from + (to - from) * t
            }
            Trajectory::Sinusoidal { center, amplitude, period_frames } => {
                let phase = 2.0 * std::f64::consts::PI * frame as f64 / period_frames.max(1.0);
                center + amplitude * phase.sin()
            }
            Trajectory::Samples(values) => {
                let idx = (frame as usize).min(values.len().saturating_sub(1));
                values.get(idx).copied().unwrap_or(0.0)
            }
        }
    }
}

/// Scripted recording
#[derive(Debug, Clone)]
pub struct SyntheticClip {
    pub fps: f64,
    pub frame_count: u64,
    pub left: Trajectory,
    pub right: Trajectory,
    /// Uniform jitter amplitude added to both sides
    pub noise: f64,
    pub seed: u64,
    /// Frames that fail to decode
    pub decode_failures: BTreeSet<u64>,
    /// Frames in which no subject is visible
    pub undetected: BTreeSet<u64>,
    /// Simulated decode cost per frame
    pub frame_delay: Duration,
}

impl SyntheticClip {
    pub fn new(fps: f64, frame_count: u64, left: Trajectory, right: Trajectory) -> Self {
        Self {
            fps,
            frame_count,
            left,
            right,
            noise: 0.0,
            seed: 0,
            decode_failures: BTreeSet::new(),
            undetected: BTreeSet::new(),
            frame_delay: Duration::ZERO,
        }
    }

    /// Both sides follow the same explicit sample list
    pub fn from_samples(fps: f64, values: &[f64]) -> Self {
        let trajectory = Trajectory::Samples(values.to_vec());
        Self::new(fps, values.len() as u64, trajectory.clone(), trajectory)
    }

    pub fn with_noise(mut self, amplitude: f64, seed: u64) -> Self {
        self.noise = amplitude;
        self.seed = seed;
        self
    }

    pub fn with_decode_failures(mut self, frames: impl IntoIterator<Item = u64>) -> Self {
        self.decode_failures.extend(frames);
        self
    }

    pub fn with_undetected(mut self, frames: impl IntoIterator<Item = u64>) -> Self {
        self.undetected.extend(frames);
        self
    }

    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    /// Ground truth for `frame` including jitter
    pub fn values_at(&self, frame: u64) -> (f64, f64) {
        let mut left = self.left.value_at(frame, self.frame_count);
        let mut right = self.right.value_at(frame, self.frame_count);
        if self.noise > 0.0 {
            let mut rng = StdRng::seed_from_u64(self.seed ^ frame.wrapping_mul(0x9E37_79B9_7F4A_7C15));
            left += rng.gen_range(-self.noise..=self.noise);
            right += rng.gen_range(-self.noise..=self.noise);
        }
        (left, right)
    }

    fn render(&self, frame: u64) -> Frame {
        let mut out = Frame::blank(frame, FRAME_WIDTH, FRAME_HEIGHT, 0);
        let (left, right) = self.values_at(frame);
        out.pixels[0..8].copy_from_slice(&left.to_le_bytes());
        out.pixels[8..16].copy_from_slice(&right.to_le_bytes());
        out.pixels[16] = u8::from(!self.undetected.contains(&frame));
        out
    }
}

/// Video source replaying a [`SyntheticClip`]
pub struct SyntheticVideo {
    clip: Arc<SyntheticClip>,
    cursor: u64,
}

impl SyntheticVideo {
    pub fn new(clip: Arc<SyntheticClip>) -> Self {
        Self { clip, cursor: 0 }
    }
}

impl VideoSource for SyntheticVideo {
    fn fps(&self) -> f64 {
        self.clip.fps
    }

    fn frame_count(&self) -> u64 {
        self.clip.frame_count
    }

    fn seek(&mut self, index: u64) -> Result<(), VideoError> {
        if index > self.clip.frame_count {
            return Err(VideoError::Seek {
                frame: index,
                reason: format!("clip has {} frames", self.clip.frame_count),
            });
        }
        self.cursor = index;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, VideoError> {
        if self.cursor >= self.clip.frame_count {
            return Ok(None);
        }
        let index = self.cursor;
        self.cursor += 1;

        if !self.clip.frame_delay.is_zero() {
            std::thread::sleep(self.clip.frame_delay);
        }
        if self.clip.decode_failures.contains(&index) {
            return Err(VideoError::Decode {
                frame: index,
                reason: "scripted decode failure".to_string(),
            });
        }
        Ok(Some(self.clip.render(index)))
    }
}

/// Opener resolving paths to registered clips
#[derive(Debug, Clone, Default)]
pub struct SyntheticOpener {
    clips: HashMap<PathBuf, Arc<SyntheticClip>>,
}

impl SyntheticOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clip(mut self, path: impl Into<PathBuf>, clip: SyntheticClip) -> Self {
        self.clips.insert(path.into(), Arc::new(clip));
        self
    }
}

impl VideoOpener for SyntheticOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, VideoError> {
        let clip = self
            .clips
            .get(path)
            .ok_or_else(|| VideoError::NotFound(path.to_path_buf()))?;
        Ok(Box::new(SyntheticVideo::new(Arc::clone(clip))))
    }
}

/// Provider decoding the ground truth painted by [`SyntheticVideo`]
pub struct SyntheticProvider {
    inference_delay: Duration,
}

impl KeypointProvider for SyntheticProvider {
    fn infer(&mut self, frame: &Frame, _conf: f32, _iou: f32) -> Result<Vec<DetectedSubject>, ProviderError> {
        if !self.inference_delay.is_zero() {
            std::thread::sleep(self.inference_delay);
        }
        if frame.pixels.len() < HEADER_LEN {
            return Err(ProviderError::InferenceFailed(format!(
                "frame {} too small for synthetic header",
                frame.index
            )));
        }
        if frame.pixels[16] == 0 {
            return Ok(Vec::new());
        }
        let left = read_f64(&frame.pixels[0..8]);
        let right = read_f64(&frame.pixels[8..16]);
        Ok(vec![skeleton(left, right)])
    }
}

fn read_f64(bytes: &[u8]) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    f64::from_le_bytes(buf)
}

/// Skeleton whose shoulder angle and wrist height ratio both equal the value
/// of the corresponding side
pub fn skeleton(left: f64, right: f64) -> DetectedSubject {
    let mut subject = DetectedSubject::new();
    for (side, value, x, outward) in [(Side::Left, left, LEFT_X, -1.0), (Side::Right, right, RIGHT_X, 1.0)] {
        let theta = value.to_radians();
        subject.set(KeypointName::shoulder(side), Keypoint::new(x, SHOULDER_Y, LANDMARK_CONFIDENCE));
        subject.set(KeypointName::hip(side), Keypoint::new(x, HIP_Y, LANDMARK_CONFIDENCE));
        subject.set(
            KeypointName::elbow(side),
            Keypoint::new(
                x + outward * UPPER_ARM_LENGTH * theta.sin(),
                SHOULDER_Y + UPPER_ARM_LENGTH * theta.cos(),
                LANDMARK_CONFIDENCE,
            ),
        );
        subject.set(
            KeypointName::wrist(side),
            Keypoint::new(x + outward * 20.0, HIP_Y - value * (HIP_Y - SHOULDER_Y), LANDMARK_CONFIDENCE),
        );
    }
    subject
}

/// Factory handing out [`SyntheticProvider`]s
#[derive(Debug, Clone, Default)]
pub struct SyntheticProviderFactory {
    init_failure: Option<String>,
    inference_delay: Duration,
}

impl SyntheticProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `create` call fails with the given reason
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            init_failure: Some(reason.into()),
            inference_delay: Duration::ZERO,
        }
    }

    pub fn with_inference_delay(mut self, delay: Duration) -> Self {
        self.inference_delay = delay;
        self
    }
}

impl ProviderFactory for SyntheticProviderFactory {
    fn create(&self) -> Result<Box<dyn KeypointProvider>, ProviderError> {
        if let Some(reason) = &self.init_failure {
            return Err(ProviderError::ModelUnavailable(reason.clone()));
        }
        Ok(Box::new(SyntheticProvider {
            inference_delay: self.inference_delay,
        }))
    }
}
