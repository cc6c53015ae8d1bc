// src/source/types.rs
//! Core types exchanged with the pose-estimation boundary

use serde::{Deserialize, Serialize};
use std::fmt;

/// Camera angle a recording was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Front,
    Side,
    Back,
}

impl View {
    /// All views in processing order
    pub const ALL: [View; 3] = [View::Front, View::Side, View::Back];

    /// Metric the geometric extractor derives for this view
    pub fn metric(self) -> Metric {
        match self {
            View::Front => Metric::Abduction,
            View::Side => Metric::Flexion,
            View::Back => Metric::WristHeight,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            View::Front => "front",
            View::Side => "side",
            View::Back => "back",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl Default for Side {
    fn default() -> Self {
        Side::Left
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-frame quantity measured for a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Shoulder abduction angle in degrees (front view)
    Abduction,
    /// Shoulder flexion angle in degrees (side view)
    Flexion,
    /// Unsigned wrist height ratio (back view)
    WristHeight,
}

impl Metric {
    /// Whether samples of this metric are joint angles in degrees
    pub fn is_angle(self) -> bool {
        !matches!(self, Metric::WristHeight)
    }

    /// Axis label used for charts and reports
    pub fn unit_label(self) -> &'static str {
        match self {
            Metric::Abduction | Metric::Flexion => "Angle (deg)",
            Metric::WristHeight => "Height ratio",
        }
    }
}

/// COCO-17 keypoint names produced by the pose provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeypointName {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl KeypointName {
    /// Position of this keypoint in the provider's output array
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn shoulder(side: Side) -> Self {
        match side {
            Side::Left => KeypointName::LeftShoulder,
            Side::Right => KeypointName::RightShoulder,
        }
    }

    pub fn elbow(side: Side) -> Self {
        match side {
            Side::Left => KeypointName::LeftElbow,
            Side::Right => KeypointName::RightElbow,
        }
    }

    pub fn wrist(side: Side) -> Self {
        match side {
            Side::Left => KeypointName::LeftWrist,
            Side::Right => KeypointName::RightWrist,
        }
    }

    pub fn hip(side: Side) -> Self {
        match side {
            Side::Left => KeypointName::LeftHip,
            Side::Right => KeypointName::RightHip,
        }
    }
}

/// Number of keypoints per detected subject
pub const KEYPOINT_COUNT: usize = 17;

/// A single 2D image-plane landmark
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }
}

/// One person detected in a frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectedSubject {
    keypoints: [Option<Keypoint>; KEYPOINT_COUNT],
}

impl DetectedSubject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of a landmark
    pub fn with(mut self, name: KeypointName, point: Keypoint) -> Self {
        self.set(name, point);
        self
    }

    pub fn set(&mut self, name: KeypointName, point: Keypoint) {
        self.keypoints[name.index()] = Some(point);
    }

    pub fn get(&self, name: KeypointName) -> Option<&Keypoint> {
        self.keypoints[name.index()].as_ref()
    }

    /// Number of landmarks present
    pub fn len(&self) -> usize {
        self.keypoints.iter().filter(|k| k.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A decoded video frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Absolute 0-based index in the source video
    pub index: u64,
    pub width: u32,
    pub height: u32,
    /// Packed RGB8 pixel data, row-major
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Frame of the given size filled with a single gray level
    pub fn blank(index: u64, width: u32, height: u32, level: u8) -> Self {
        Self {
            index,
            width,
            height,
            pixels: vec![level; width as usize * height as usize * 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypoint_indices_follow_coco_order() {
        assert_eq!(KeypointName::Nose.index(), 0);
        assert_eq!(KeypointName::LeftShoulder.index(), 5);
        assert_eq!(KeypointName::RightWrist.index(), 10);
        assert_eq!(KeypointName::RightAnkle.index(), KEYPOINT_COUNT - 1);
    }

    #[test]
    fn test_view_metric_mapping() {
        assert_eq!(View::Front.metric(), Metric::Abduction);
        assert_eq!(View::Side.metric(), Metric::Flexion);
        assert_eq!(View::Back.metric(), Metric::WristHeight);
        assert!(!Metric::WristHeight.is_angle());
    }

    #[test]
    fn test_subject_builder() {
        let subject = DetectedSubject::new()
            .with(KeypointName::LeftHip, Keypoint::new(1.0, 2.0, 0.9));
        assert_eq!(subject.len(), 1);
        assert_eq!(subject.get(KeypointName::LeftHip).map(|k| k.y), Some(2.0));
        assert!(subject.get(KeypointName::RightHip).is_none());
    }

    #[test]
    fn test_view_serde_lowercase() {
        assert_eq!(serde_json::to_string(&View::Back).unwrap(), "\"back\"");
        let side: Side = serde_json::from_str("\"right\"").unwrap();
        assert_eq!(side, Side::Right);
    }
}
