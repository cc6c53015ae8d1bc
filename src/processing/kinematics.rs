// src/processing/kinematics.rs
//! Time-series derivation and summary statistics for per-view samples

use serde::{Deserialize, Serialize};

/// Fixed angle stages in degrees. Both bounds are inclusive, so a value on a
/// boundary contributes to both neighbouring stages.
pub const STAGE_BOUNDS: [(f64, f64); 4] = [(0.0, 45.0), (45.0, 90.0), (90.0, 135.0), (135.0, 180.0)];

/// Mean absolute rate per angle stage
pub type StageVector = [f64; 4];

/// First difference scaled by the frame rate. Length is `values.len() - 1`
/// (empty for fewer than two values).
pub fn rate_of_change(values: &[f64], fps: f64) -> Vec<f64> {
    values.windows(2).map(|w| (w[1] - w[0]) * fps).collect()
}

/// Angular velocity in units per second
pub fn velocity(values: &[f64], fps: f64) -> Vec<f64> {
    rate_of_change(values, fps)
}

/// Second difference of `values`; length `values.len() - 2`
pub fn acceleration(values: &[f64], fps: f64) -> Vec<f64> {
    rate_of_change(&velocity(values, fps), fps)
}

/// Causal trailing moving average.
///
/// `out[i]` is the mean of the last `window` inputs up to and including `i`;
/// the first outputs average over however many inputs exist so far. A window
/// of zero behaves like a window of one.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            mean(&values[start..=i])
        })
        .collect()
}

/// Mean |rate| per stage, selecting samples by their angle value.
///
/// `angles[i]` is paired with `rates[i]` for every `i < rates.len()`. An
/// empty stage reports exactly `0.0`.
pub fn stage_bins(angles: &[f64], rates: &[f64]) -> StageVector {
    let mut out = [0.0; 4];
    for (slot, (lo, hi)) in out.iter_mut().zip(STAGE_BOUNDS) {
        let (sum, count) = angles
            .iter()
            .zip(rates)
            .filter(|(angle, _)| **angle >= lo && **angle <= hi)
            .fold((0.0, 0usize), |(sum, count), (_, rate)| (sum + rate.abs(), count + 1));
        if count > 0 {
            *slot = sum / count as f64;
        }
    }
    out
}

fn later_half(values: &[f64]) -> &[f64] {
    &values[values.len() / 2..]
}

fn max_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn min_of(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().map(|v| v.abs()).fold(0.0, f64::max)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Summary of one side of an angle view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleSummary {
    /// Maximum over the later half of the sequence
    pub max_angle: f64,
    /// Minimum over the later half of the sequence
    pub min_angle: f64,
    /// Mean over the whole sequence
    pub mean_angle: f64,
    pub range: f64,
    pub max_velocity: f64,
    pub max_acceleration: f64,
    pub velocity_stages: StageVector,
    pub acceleration_stages: StageVector,
}

impl AngleSummary {
    /// `None` for an empty sequence
    pub fn from_series(angles: &[f64], fps: f64) -> Option<Self> {
        Self::from_derived(angles, &velocity(angles, fps), &acceleration(angles, fps))
    }

    /// Summary over precomputed [`velocity`] and [`acceleration`] series of
    /// `angles`
    pub fn from_derived(angles: &[f64], velocity: &[f64], acceleration: &[f64]) -> Option<Self> {
        if angles.is_empty() {
            return None;
        }
        let half = later_half(angles);
        let max_angle = max_of(half);
        let min_angle = min_of(half);

        Some(Self {
            max_angle,
            min_angle,
            mean_angle: mean(angles),
            range: max_angle - min_angle,
            max_velocity: max_abs(velocity),
            max_acceleration: max_abs(acceleration),
            velocity_stages: stage_bins(angles, velocity),
            acceleration_stages: stage_bins(angles, acceleration),
        })
    }
}

/// Summary of one wrist in the back view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WristSummary {
    pub max_height: f64,
    pub min_height: f64,
    pub mean_height: f64,
    pub range: f64,
    pub max_rate: f64,
}

impl WristSummary {
    pub fn from_series(ratios: &[f64], fps: f64) -> Option<Self> {
        if ratios.is_empty() {
            return None;
        }
        let half = later_half(ratios);
        let max_height = max_of(half);
        let min_height = min_of(half);
        Some(Self {
            max_height,
            min_height,
            mean_height: mean(ratios),
            range: max_height - min_height,
            max_rate: max_abs(&rate_of_change(ratios, fps)),
        })
    }
}
