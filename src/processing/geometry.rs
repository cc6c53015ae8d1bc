// src/processing/geometry.rs
//! Per-frame geometric features computed from detected keypoints

use crate::source::types::{DetectedSubject, Keypoint, KeypointName, Side, View};

/// Angle at vertex `b` between the rays `b -> a` and `b -> c`, in degrees.
///
/// The result is always in `[0, 180]` and symmetric in `a` and `c`.
pub fn three_point_angle(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    let ray_a = (a.1 - b.1).atan2(a.0 - b.0);
    let ray_c = (c.1 - b.1).atan2(c.0 - b.0);
    let mut angle = (ray_c - ray_a).to_degrees().abs();
    if angle > 180.0 {
        angle = 360.0 - angle;
    }
    angle
}

fn point(subject: &DetectedSubject, name: KeypointName) -> Option<(f64, f64)> {
    subject.get(name).map(|k: &Keypoint| (k.x, k.y))
}

/// Shoulder abduction: vertex at the shoulder, rays to the elbow and the hip
pub fn abduction_angle(subject: &DetectedSubject, side: Side) -> Option<f64> {
    let elbow = point(subject, KeypointName::elbow(side))?;
    let shoulder = point(subject, KeypointName::shoulder(side))?;
    let hip = point(subject, KeypointName::hip(side))?;
    Some(three_point_angle(elbow, shoulder, hip))
}

/// Shoulder flexion: vertex at the shoulder, rays to the hip and the elbow
pub fn flexion_angle(subject: &DetectedSubject, side: Side) -> Option<f64> {
    let hip = point(subject, KeypointName::hip(side))?;
    let shoulder = point(subject, KeypointName::shoulder(side))?;
    let elbow = point(subject, KeypointName::elbow(side))?;
    Some(three_point_angle(hip, shoulder, elbow))
}

/// Unsigned wrist heights relative to the hip midpoint, normalized by the
/// vertical hip-to-shoulder distance. Returns `(left, right)`.
pub fn wrist_height_ratios(subject: &DetectedSubject) -> Option<(f64, f64)> {
    let left_shoulder = point(subject, KeypointName::LeftShoulder)?;
    let right_shoulder = point(subject, KeypointName::RightShoulder)?;
    let left_hip = point(subject, KeypointName::LeftHip)?;
    let right_hip = point(subject, KeypointName::RightHip)?;
    let left_wrist = point(subject, KeypointName::LeftWrist)?;
    let right_wrist = point(subject, KeypointName::RightWrist)?;

    let shoulder_mid_y = (left_shoulder.1 + right_shoulder.1) / 2.0;
    let hip_mid_y = (left_hip.1 + right_hip.1) / 2.0;
    let torso = hip_mid_y - shoulder_mid_y;
    if torso.abs() < f64::EPSILON {
        return None;
    }

    let ratio = |wrist_y: f64| ((wrist_y - hip_mid_y) / torso).abs();
    Some((ratio(left_wrist.1), ratio(right_wrist.1)))
}

/// Left/right value pair measured on one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideValues {
    pub left: f64,
    pub right: f64,
}

impl SideValues {
    pub fn get(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Measure the metric of `view` for both sides.
///
/// `None` when any keypoint needed for either side is missing; the caller
/// skips the frame.
pub fn measure(view: View, subject: &DetectedSubject) -> Option<SideValues> {
    match view {
        View::Front => Some(SideValues {
            left: abduction_angle(subject, Side::Left)?,
            right: abduction_angle(subject, Side::Right)?,
        }),
        View::Side => Some(SideValues {
            left: flexion_angle(subject, Side::Left)?,
            right: flexion_angle(subject, Side::Right)?,
        }),
        View::Back => {
            let (left, right) = wrist_height_ratios(subject)?;
            Some(SideValues { left, right })
        }
    }
}
