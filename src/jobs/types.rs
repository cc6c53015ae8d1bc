// src/jobs/types.rs
//! Job identifiers, requests, snapshots and results

use crate::config::AnalysisSettings;
use crate::error::{RomErrorBuilder, RomResult};
use crate::jobs::state::JobState;
use crate::processing::pipeline::ViewAnalysisResult;
use crate::processing::windowing::TimelineWindow;
use crate::report::record::ReportRecord;
use crate::source::adapter::DetectionThresholds;
use crate::source::types::{Side, View};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Opaque job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(JobId)
    }
}

/// Per-job analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub confidence_threshold: f32,
    pub overlap_threshold: f32,
    /// Timeline window per view; views without an entry use the full video
    #[serde(default)]
    pub windows: BTreeMap<View, TimelineWindow>,
    /// Side analysed for side-view keyframes
    #[serde(default)]
    pub selected_side: Side,
}

impl AnalysisConfig {
    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self {
            confidence_threshold: settings.confidence_threshold,
            overlap_threshold: settings.overlap_threshold,
            windows: BTreeMap::new(),
            selected_side: Side::default(),
        }
    }

    pub fn with_window(mut self, view: View, window: TimelineWindow) -> Self {
        self.windows.insert(view, window);
        self
    }

    pub fn with_selected_side(mut self, side: Side) -> Self {
        self.selected_side = side;
        self
    }

    pub fn window(&self, view: View) -> TimelineWindow {
        self.windows.get(&view).copied().unwrap_or_default()
    }

    pub fn thresholds(&self, min_keypoint_confidence: f64) -> DetectionThresholds {
        DetectionThresholds {
            confidence: self.confidence_threshold,
            overlap: self.overlap_threshold,
            min_keypoint_confidence,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::from_settings(&AnalysisSettings::default())
    }
}

/// Submission payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub subject_id: String,
    pub subject_name: String,
    pub videos: BTreeMap<View, PathBuf>,
    #[serde(default)]
    pub config: AnalysisConfig,
}

impl AnalysisRequest {
    pub fn new(subject_id: impl Into<String>, subject_name: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            subject_name: subject_name.into(),
            videos: BTreeMap::new(),
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_video(mut self, view: View, path: impl Into<PathBuf>) -> Self {
        self.videos.insert(view, path.into());
        self
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Reject requests that can never produce a result
    pub fn validate(&self) -> RomResult<()> {
        let invalid = |reason: String| RomErrorBuilder::new("job_manager", "submit").invalid_data("analysis request", &reason);

        if self.subject_id.trim().is_empty() {
            return Err(invalid("subject id is empty".to_string()));
        }
        if self.videos.is_empty() {
            return Err(invalid("no input videos".to_string()));
        }
        for (name, value) in [
            ("confidence threshold", self.config.confidence_threshold),
            ("overlap threshold", self.config.overlap_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{} {} outside [0, 1]", name, value)));
            }
        }
        for window in self.config.windows.values() {
            window.validate()?;
        }
        Ok(())
    }
}

/// Everything a completed job produced
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub record: ReportRecord,
    pub views: BTreeMap<View, ViewAnalysisResult>,
    pub data_file: PathBuf,
    pub document: Option<PathBuf>,
}

/// Point-in-time copy of a job's status record
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub id: JobId,
    pub subject_id: String,
    pub state: JobState,
    /// Percent complete in `[0, 100]`
    pub progress: f64,
    pub message: String,
    pub current_view: Option<View>,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub submitted_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub finished_at_ms: Option<u64>,
    pub result: Option<Arc<JobResult>>,
}

impl JobSnapshot {
    pub(crate) fn queued(id: JobId, subject_id: &str, now_ms: u64) -> Self {
        Self {
            id,
            subject_id: subject_id.to_string(),
            state: JobState::Queued,
            progress: 0.0,
            message: "queued".to_string(),
            current_view: None,
            error: None,
            warnings: Vec::new(),
            submitted_at_ms: now_ms,
            started_at_ms: None,
            finished_at_ms: None,
            result: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
