// src/report/record.rs
//! Structured report record passed to the document generator and persisted
//! as the analysis data file

use crate::processing::kinematics::{AngleSummary, WristSummary};
use crate::processing::pipeline::ViewAnalysisResult;
use crate::processing::scoring::{Assessment, SideContribution};
use crate::processing::windowing::FrameSpan;
use crate::report::mapping::SubjectRecord;
use crate::source::types::{Side, View};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Per-side summary, shaped by the view's metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SideSummary {
    Angle(AngleSummary),
    Wrist(WristSummary),
}

/// Summary of one analysed view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewReport {
    pub fps: f64,
    pub span: FrameSpan,
    pub timeline_start_seconds: f64,
    pub samples: usize,
    pub frames_skipped: u64,
    pub left: Option<SideSummary>,
    pub right: Option<SideSummary>,
}

impl ViewReport {
    pub fn from_result(result: &ViewAnalysisResult) -> Self {
        let summary = |side: Side| {
            if result.view.metric().is_angle() {
                result.angle_summary(side).map(SideSummary::Angle)
            } else {
                result.wrist_summary(side).map(SideSummary::Wrist)
            }
        };
        Self {
            fps: result.fps,
            span: result.span,
            timeline_start_seconds: result.window.start_seconds,
            samples: result.samples.len(),
            frames_skipped: result.frames_skipped,
            left: summary(Side::Left),
            right: summary(Side::Right),
        }
    }

    pub fn side(&self, side: Side) -> Option<&SideSummary> {
        match side {
            Side::Left => self.left.as_ref(),
            Side::Right => self.right.as_ref(),
        }
    }
}

/// Views whose shoulder angles feed the composite score. Front abduction
/// is charted and reported but not scored.
pub const SCORED_VIEWS: [View; 1] = [View::Side];

/// Keyframe as listed in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyframeEntry {
    pub view: View,
    pub label: String,
    pub frame: u64,
    pub value: f64,
    pub path: Option<PathBuf>,
}

/// Complete report of one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub job_id: String,
    pub subject: SubjectRecord,
    pub generated_at_ms: u64,
    pub selected_side: Side,
    pub views: BTreeMap<View, ViewReport>,
    pub scoring_strategy: String,
    pub assessment: Assessment,
    pub keyframes: Vec<KeyframeEntry>,
    pub charts: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl ReportRecord {
    /// Score inputs: both sides of every scored view that produced a summary
    pub fn contributions(views: &BTreeMap<View, ViewReport>) -> Vec<SideContribution> {
        let mut out = Vec::new();
        for (&view, report) in views.iter().filter(|(view, _)| SCORED_VIEWS.contains(*view)) {
            for side in Side::BOTH {
                if let Some(SideSummary::Angle(summary)) = report.side(side) {
                    out.push(SideContribution {
                        view,
                        side,
                        max_angle: summary.max_angle,
                        max_velocity: summary.max_velocity,
                    });
                }
            }
        }
        out
    }

    /// Pretty JSON with every floating point value rounded to `places`
    pub fn to_rounded_json(&self, places: u32) -> Result<String, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        round_floats(&mut value, places);
        serde_json::to_string_pretty(&value)
    }
}

/// Round every non-integer number in `value` to `places` decimals
pub fn round_floats(value: &mut Value, places: u32) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(f) = n.as_f64() {
                let scale = 10f64.powi(places as i32);
                let rounded = (f * scale).round() / scale;
                if let Some(number) = serde_json::Number::from_f64(rounded) {
                    *n = number;
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| round_floats(v, places)),
        Value::Object(map) => map.values_mut().for_each(|v| round_floats(v, places)),
        _ => {}
    }
}
