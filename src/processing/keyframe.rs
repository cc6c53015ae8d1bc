// src/processing/keyframe.rs
//! Extremum frame selection for still-image extraction

use crate::processing::pipeline::ViewAnalysisResult;
use crate::source::traits::{VideoError, VideoSource};
use crate::source::types::{Frame, Side, View};
use serde::{Deserialize, Serialize};

/// One frame picked for still extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub view: View,
    pub side: Side,
    /// Joint the value belongs to, e.g. `left_shoulder` or `right_wrist`
    pub label: String,
    /// Absolute frame index in the source video
    pub frame: u64,
    pub value: f64,
}

impl Keyframe {
    /// File stem of the extracted still
    pub fn file_stem(&self) -> String {
        format!("{}_{}_keyframe", self.view, self.label)
    }
}

/// Index and value of the maximum in the later half of `values`. The first
/// occurrence wins on ties.
pub fn later_half_peak(values: &[f64]) -> Option<(usize, f64)> {
    let offset = values.len() / 2;
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values[offset..].iter().enumerate() {
        match best {
            Some((_, current)) if v <= current => {}
            _ => best = Some((offset + i, v)),
        }
    }
    best
}

fn joint_label(view: View, side: Side) -> String {
    match view {
        View::Front | View::Side => format!("{}_shoulder", side),
        View::Back => format!("{}_wrist", side),
    }
}

/// Sides a view contributes keyframes for
pub fn keyframe_sides(view: View, selected_side: Side) -> Vec<Side> {
    match view {
        View::Front | View::Back => Side::BOTH.to_vec(),
        View::Side => vec![selected_side],
    }
}

/// Select the peak frames of a view result
pub fn select_keyframes(result: &ViewAnalysisResult, selected_side: Side) -> Vec<Keyframe> {
    keyframe_sides(result.view, selected_side)
        .into_iter()
        .filter_map(|side| {
            let values = result.values(side);
            let (index, value) = later_half_peak(&values)?;
            let sample = result.samples.get(index)?;
            let frame = result
                .window
                .absolute_frame(sample.relative_frame, result.fps, result.total_frames);
            Some(Keyframe {
                view: result.view,
                side,
                label: joint_label(result.view, side),
                frame,
                value,
            })
        })
        .collect()
}

/// Seek to and decode the keyframe's frame
pub fn extract_still(video: &mut dyn VideoSource, keyframe: &Keyframe) -> Result<Frame, VideoError> {
    video.seek(keyframe.frame)?;
    video.read_frame()?.ok_or_else(|| VideoError::Decode {
        frame: keyframe.frame,
        reason: "end of stream".to_string(),
    })
}
