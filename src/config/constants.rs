// src/config/constants.rs
//! System-wide configuration constants

/// Keypoint detection and time-series constants
pub mod analysis {
    pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
    pub const DEFAULT_OVERLAP_THRESHOLD: f32 = 0.45;
    pub const DEFAULT_MIN_KEYPOINT_CONFIDENCE: f64 = 0.0;
    pub const DEFAULT_SMOOTHING_WINDOW: usize = 6;
    pub const DEFAULT_PROGRESS_INTERVAL_FRAMES: u64 = 10;
}

/// Composite score weighting
pub mod scoring {
    pub const ANGLE_CEILING: f64 = 30.0;
    pub const ANGLE_FULL_SCALE_DEG: f64 = 180.0;
    pub const VELOCITY_CEILING: f64 = 35.0;
    pub const VELOCITY_FULL_SCALE: f64 = 10.0;
    pub const NORMAL_THRESHOLD: f64 = 85.0;
    pub const MILD_THRESHOLD: f64 = 70.0;
}

/// Job manager sizing
pub mod jobs {
    pub const DEFAULT_WORKER_COUNT: usize = 2;
    pub const MAX_WORKER_COUNT: usize = 64;
    pub const DEFAULT_QUEUE_CAPACITY: usize = 16;
    pub const DEFAULT_RETENTION_SECS: u64 = 3600;
}

/// Input video acceptance
pub mod input {
    pub const ALLOWED_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];
    pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 100;
    pub const BYTES_PER_MB: u64 = 1024 * 1024;
}

/// Output layout
pub mod output {
    pub const DEFAULT_ROOT_DIR: &str = "patients_data";
    pub const RESULTS_DIR_NAME: &str = "analysis_results";
    pub const REPORTS_DIR_NAME: &str = "reports";
    pub const DATA_FILE_NAME: &str = "analysis_data.json";
    pub const REPORT_FILE_NAME: &str = "analysis_report";
    pub const DEFAULT_DECIMAL_PLACES: u32 = 2;
}

/// Configuration file locations
pub mod paths {
    pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
    pub const LOCAL_CONFIG_FILE: &str = "config/local.toml";
    pub const ENV_PREFIX: &str = "ROM";
    pub const ENV_SEPARATOR: &str = "__";
}
