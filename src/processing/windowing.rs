// src/processing/windowing.rs
//! Timeline windows restricting analysis to a slice of a recording

use crate::error::{RomErrorBuilder, RomResult};
use serde::{Deserialize, Serialize};

/// Analysed time span of one video in seconds. `end_seconds = None` runs to
/// the end of the recording.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelineWindow {
    #[serde(default)]
    pub start_seconds: f64,
    #[serde(default)]
    pub end_seconds: Option<f64>,
}

/// Absolute frame span selected by a window, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSpan {
    pub start: u64,
    pub end: u64,
}

impl FrameSpan {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TimelineWindow {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn new(start_seconds: f64, end_seconds: Option<f64>) -> Self {
        Self { start_seconds, end_seconds }
    }

    pub fn validate(&self) -> RomResult<()> {
        if !self.start_seconds.is_finite() || self.start_seconds < 0.0 {
            return Err(RomErrorBuilder::new("timeline_window", "validate")
                .invalid_data("timeline window", &format!("start {} must be a non-negative number", self.start_seconds)));
        }
        if let Some(end) = self.end_seconds {
            if !end.is_finite() || end <= self.start_seconds {
                return Err(RomErrorBuilder::new("timeline_window", "validate")
                    .invalid_data("timeline window", &format!("end {} must be after start {}", end, self.start_seconds)));
            }
        }
        Ok(())
    }

    /// First absolute frame of the window: `floor(start_seconds * fps)`
    pub fn start_frame(&self, fps: f64) -> u64 {
        (self.start_seconds * fps).floor().max(0.0) as u64
    }

    /// Frame span for a recording of `total_frames` at `fps`
    pub fn frame_span(&self, fps: f64, total_frames: u64) -> FrameSpan {
        let start = self.start_frame(fps).min(total_frames);
        let end = match self.end_seconds {
            Some(end) => ((end * fps).floor().max(0.0) as u64).min(total_frames),
            None => total_frames,
        };
        FrameSpan { start, end: end.max(start) }
    }

    /// Map a 1-based frame position inside the window back to an absolute
    /// frame index, clamped into the recording
    pub fn absolute_frame(&self, relative_frame: u64, fps: f64, total_frames: u64) -> u64 {
        let absolute = (self.start_frame(fps) + relative_frame).saturating_sub(1);
        absolute.min(total_frames.saturating_sub(1))
    }

    /// 1-based position of an absolute frame inside the window
    pub fn relative_frame(&self, absolute_frame: u64, fps: f64) -> u64 {
        absolute_frame.saturating_sub(self.start_frame(fps)) + 1
    }
}
