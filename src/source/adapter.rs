// src/source/adapter.rs
//! Per-frame adapter over a [`KeypointProvider`]

use crate::source::traits::{KeypointProvider, ProviderError};
use crate::source::types::{DetectedSubject, Frame, KeypointName, KEYPOINT_COUNT};

/// Thresholds forwarded to the provider on every call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionThresholds {
    pub confidence: f32,
    pub overlap: f32,
    /// Landmarks reported with a lower confidence are treated as absent
    pub min_keypoint_confidence: f64,
}

/// Wraps a provider and reduces its output to the single subject the
/// pipeline analyses
pub struct KeypointSource {
    provider: Box<dyn KeypointProvider>,
    thresholds: DetectionThresholds,
    frames_inferred: u64,
    frames_without_subject: u64,
}

impl KeypointSource {
    pub fn new(provider: Box<dyn KeypointProvider>, thresholds: DetectionThresholds) -> Self {
        Self {
            provider,
            thresholds,
            frames_inferred: 0,
            frames_without_subject: 0,
        }
    }

    /// Run inference on one frame and return the first detected subject with
    /// low-confidence landmarks removed. `Ok(None)` means nobody was detected.
    pub fn detect(&mut self, frame: &Frame) -> Result<Option<DetectedSubject>, ProviderError> {
        self.frames_inferred += 1;
        let subjects = self.provider.infer(
            frame,
            self.thresholds.confidence,
            self.thresholds.overlap,
        )?;

        let Some(first) = subjects.into_iter().next() else {
            self.frames_without_subject += 1;
            return Ok(None);
        };

        Ok(Some(self.filter_landmarks(first)))
    }

    pub fn frames_inferred(&self) -> u64 {
        self.frames_inferred
    }

    pub fn frames_without_subject(&self) -> u64 {
        self.frames_without_subject
    }

    fn filter_landmarks(&self, subject: DetectedSubject) -> DetectedSubject {
        let min = self.thresholds.min_keypoint_confidence;
        let mut filtered = DetectedSubject::new();
        for name in ALL_KEYPOINTS {
            if let Some(point) = subject.get(name) {
                if point.confidence >= min {
                    filtered.set(name, *point);
                }
            }
        }
        filtered
    }
}

const ALL_KEYPOINTS: [KeypointName; KEYPOINT_COUNT] = [
    KeypointName::Nose,
    KeypointName::LeftEye,
    KeypointName::RightEye,
    KeypointName::LeftEar,
    KeypointName::RightEar,
    KeypointName::LeftShoulder,
    KeypointName::RightShoulder,
    KeypointName::LeftElbow,
    KeypointName::RightElbow,
    KeypointName::LeftWrist,
    KeypointName::RightWrist,
    KeypointName::LeftHip,
    KeypointName::RightHip,
    KeypointName::LeftKnee,
    KeypointName::RightKnee,
    KeypointName::LeftAnkle,
    KeypointName::RightAnkle,
];
