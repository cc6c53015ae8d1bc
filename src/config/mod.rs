// src/config/mod.rs
//! Configuration management system

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::processing::scoring::{PlaceholderScorer, ScoringStrategy, WeightedScorer};
use crate::source::adapter::DetectionThresholds;

/// Complete system configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SystemConfig {
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub jobs: JobSettings,
    #[serde(default)]
    pub input: InputSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// Scoring strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    Weighted,
    Placeholder,
}

impl ScoringMode {
    pub fn strategy(self) -> Box<dyn ScoringStrategy> {
        match self {
            ScoringMode::Weighted => Box::new(WeightedScorer),
            ScoringMode::Placeholder => Box::new(PlaceholderScorer),
        }
    }
}

/// Keypoint detection and time-series settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AnalysisSettings {
    #[serde(default = "defaults::confidence_threshold")]
    pub confidence_threshold: f32,

    #[serde(default = "defaults::overlap_threshold")]
    pub overlap_threshold: f32,

    #[serde(default = "defaults::min_keypoint_confidence")]
    pub min_keypoint_confidence: f64,

    /// Moving-average window for chart series
    #[serde(default = "defaults::smoothing_window")]
    pub smoothing_window: usize,

    #[serde(default = "defaults::progress_interval_frames")]
    pub progress_interval_frames: u64,

    #[serde(default = "defaults::scoring_mode")]
    pub scoring_mode: ScoringMode,
}

/// Worker pool and status table settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JobSettings {
    #[serde(default = "defaults::worker_count")]
    pub worker_count: usize,

    /// Jobs accepted but not yet claimed by a worker
    #[serde(default = "defaults::queue_capacity")]
    pub queue_capacity: usize,

    /// How long a terminal job stays pollable
    #[serde(default = "defaults::retention_secs")]
    pub retention_secs: u64,
}

/// Input video acceptance rules
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct InputSettings {
    #[serde(default = "defaults::validate_files")]
    pub validate_files: bool,

    #[serde(default = "defaults::allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    #[serde(default = "defaults::max_file_size_mb")]
    pub max_file_size_mb: u64,
}

/// Output layout settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputSettings {
    #[serde(default = "defaults::root_dir")]
    pub root_dir: PathBuf,

    #[serde(default = "defaults::decimal_places")]
    pub decimal_places: u32,
}

/// Default value providers using constants
mod defaults {
    use super::ScoringMode;
    use crate::config::constants::*;
    use std::path::PathBuf;

    pub fn confidence_threshold() -> f32 { analysis::DEFAULT_CONFIDENCE_THRESHOLD }
    pub fn overlap_threshold() -> f32 { analysis::DEFAULT_OVERLAP_THRESHOLD }
    pub fn min_keypoint_confidence() -> f64 { analysis::DEFAULT_MIN_KEYPOINT_CONFIDENCE }
    pub fn smoothing_window() -> usize { analysis::DEFAULT_SMOOTHING_WINDOW }
    pub fn progress_interval_frames() -> u64 { analysis::DEFAULT_PROGRESS_INTERVAL_FRAMES }
    pub fn scoring_mode() -> ScoringMode { ScoringMode::Weighted }

    pub fn worker_count() -> usize { jobs::DEFAULT_WORKER_COUNT }
    pub fn queue_capacity() -> usize { jobs::DEFAULT_QUEUE_CAPACITY }
    pub fn retention_secs() -> u64 { jobs::DEFAULT_RETENTION_SECS }

    pub fn validate_files() -> bool { true }
    pub fn allowed_extensions() -> Vec<String> { input::ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect() }
    pub fn max_file_size_mb() -> u64 { input::DEFAULT_MAX_FILE_SIZE_MB }

    pub fn root_dir() -> PathBuf { PathBuf::from(output::DEFAULT_ROOT_DIR) }
    pub fn decimal_places() -> u32 { output::DEFAULT_DECIMAL_PLACES }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: defaults::confidence_threshold(),
            overlap_threshold: defaults::overlap_threshold(),
            min_keypoint_confidence: defaults::min_keypoint_confidence(),
            smoothing_window: defaults::smoothing_window(),
            progress_interval_frames: defaults::progress_interval_frames(),
            scoring_mode: defaults::scoring_mode(),
        }
    }
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            worker_count: defaults::worker_count(),
            queue_capacity: defaults::queue_capacity(),
            retention_secs: defaults::retention_secs(),
        }
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            validate_files: defaults::validate_files(),
            allowed_extensions: defaults::allowed_extensions(),
            max_file_size_mb: defaults::max_file_size_mb(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            root_dir: defaults::root_dir(),
            decimal_places: defaults::decimal_places(),
        }
    }
}

impl AnalysisSettings {
    pub fn detection_thresholds(&self) -> DetectionThresholds {
        DetectionThresholds {
            confidence: self.confidence_threshold,
            overlap: self.overlap_threshold,
            min_keypoint_confidence: self.min_keypoint_confidence,
        }
    }
}

impl JobSettings {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

impl InputSettings {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(input::BYTES_PER_MB)
    }
}

/// Configuration utility functions
impl SystemConfig {
    /// Validate configuration consistency, collecting every violation
    pub fn validate_consistency(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("confidence_threshold", self.analysis.confidence_threshold),
            ("overlap_threshold", self.analysis.overlap_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(format!("analysis.{} ({}) must be within [0, 1]", name, value));
            }
        }
        if !(0.0..=1.0).contains(&self.analysis.min_keypoint_confidence) {
            errors.push(format!(
                "analysis.min_keypoint_confidence ({}) must be within [0, 1]",
                self.analysis.min_keypoint_confidence
            ));
        }
        if self.analysis.smoothing_window == 0 {
            errors.push("analysis.smoothing_window must be at least 1".to_string());
        }
        if self.analysis.progress_interval_frames == 0 {
            errors.push("analysis.progress_interval_frames must be at least 1".to_string());
        }

        if self.jobs.worker_count == 0 || self.jobs.worker_count > jobs::MAX_WORKER_COUNT {
            errors.push(format!(
                "jobs.worker_count ({}) must be within [1, {}]",
                self.jobs.worker_count,
                jobs::MAX_WORKER_COUNT
            ));
        }
        if self.jobs.queue_capacity == 0 {
            errors.push("jobs.queue_capacity must be at least 1".to_string());
        }

        if self.input.allowed_extensions.is_empty() {
            errors.push("input.allowed_extensions must not be empty".to_string());
        }
        if self.input.max_file_size_mb == 0 {
            errors.push("input.max_file_size_mb must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
