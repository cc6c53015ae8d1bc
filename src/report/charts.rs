// src/report/charts.rs
//! Chart series built from per-view results

use crate::processing::pipeline::ViewAnalysisResult;
use crate::source::types::{Side, View};
use serde::{Deserialize, Serialize};

/// One named (x, y) series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// A chart handed to a [`crate::report::ChartRenderer`]; one file per chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    /// File stem, e.g. `front_angle_analysis`
    pub name: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ChartSeries>,
}

fn frame_series(result: &ViewAnalysisResult, smoothed: &[f64], label: String) -> ChartSeries {
    ChartSeries {
        label,
        points: result
            .samples
            .iter()
            .zip(smoothed)
            .map(|(s, &v)| (s.relative_frame as f64, v))
            .collect(),
    }
}

fn scatter(angles: &[f64], rates: &[f64], label: String) -> ChartSeries {
    ChartSeries {
        label,
        points: angles.iter().copied().zip(rates.iter().copied()).collect(),
    }
}

/// Charts for one view. Empty for a view without samples.
pub fn view_charts(result: &ViewAnalysisResult, smoothing_window: usize) -> Vec<ChartSpec> {
    if result.is_empty() {
        return Vec::new();
    }
    let metric = result.view.metric();

    if result.view == View::Back {
        return vec![ChartSpec {
            name: "back_wrist_height".to_string(),
            title: "Wrist height".to_string(),
            x_label: "Frame".to_string(),
            y_label: metric.unit_label().to_string(),
            series: Side::BOTH
                .iter()
                .map(|&side| {
                    let smoothed = result.smoothed(side, smoothing_window);
                    frame_series(result, &smoothed, format!("{} wrist", side))
                })
                .collect(),
        }];
    }

    let mut angle_series = Vec::new();
    let mut acceleration_series = Vec::new();
    for side in Side::BOTH {
        // Rates are plotted against the smoothed angle curve
        let angles = result.smoothed(side, smoothing_window);
        angle_series.push(frame_series(result, &angles, format!("{} angle", side)));
        angle_series.push(scatter(&angles, &result.velocities(side), format!("{} velocity vs angle", side)));
        acceleration_series.push(scatter(
            &angles,
            &result.accelerations(side),
            format!("{} acceleration vs angle", side),
        ));
    }

    vec![
        ChartSpec {
            name: format!("{}_angle_analysis", result.view),
            title: format!("{} view angle analysis", result.view),
            x_label: "Frame / angle (deg)".to_string(),
            y_label: format!("{} / velocity (deg/s)", metric.unit_label()),
            series: angle_series,
        },
        ChartSpec {
            name: format!("{}_acceleration_analysis", result.view),
            title: format!("{} view acceleration analysis", result.view),
            x_label: "Angle (deg)".to_string(),
            y_label: "Acceleration (deg/s^2)".to_string(),
            series: acceleration_series,
        },
    ]
}
