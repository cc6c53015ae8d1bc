//! ROM-Core: shoulder range-of-motion analysis from recorded video
//!
//! This library turns per-view recordings of a shoulder assessment into
//! kinematic summaries, keyframes, charts and a composite score. It features:
//!
//! - A keypoint source boundary with pluggable pose providers and video decoders
//! - Per-view angle and wrist-height extraction with velocity and acceleration
//! - Keyframe selection and stage-binned kinematic summaries
//! - Swappable scoring strategies
//! - A job manager with cooperative cancellation and a bounded worker pool
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use rom_core::config::SystemConfig;
//! use rom_core::jobs::{AnalysisRequest, JobManager, JobServices};
//! use rom_core::report::InMemoryRecordStore;
//! use rom_core::source::simulator::{SyntheticClip, SyntheticOpener, SyntheticProviderFactory, Trajectory};
//! use rom_core::source::View;
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ramp = Trajectory::Ramp { from: 10.0, to: 150.0 };
//!     let clip = SyntheticClip::new(30.0, 90, ramp.clone(), ramp);
//!     let opener = SyntheticOpener::new().with_clip("front.mp4", clip);
//!     let services = JobServices::new(
//!         Arc::new(SyntheticProviderFactory::new()),
//!         Arc::new(opener),
//!         Arc::new(InMemoryRecordStore::new()),
//!     );
//!
//!     let mut config = SystemConfig::default();
//!     config.input.validate_files = false;
//!     let manager = JobManager::new(config, services)?;
//!
//!     let id = manager.submit(AnalysisRequest::new("42", "Ana").with_video(View::Front, "front.mp4"))?;
//!     let snapshot = manager.poll(id)?;
//!     println!("{}: {:.0}%", snapshot.state, snapshot.progress);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod jobs;
pub mod processing;
pub mod report;
pub mod source;
pub mod utils;

// Re-export commonly used types for convenience
pub use error::{ErrorContext, PipelineStage, RomError, RomErrorBuilder, RomResult};

pub use jobs::{
    AnalysisConfig, AnalysisRequest, CancelOutcome, CancellationToken, JobId, JobManager, JobServices, JobSnapshot,
    JobState,
};

pub use source::{KeypointProvider, KeypointSource, ProviderFactory, Side, VideoOpener, VideoSource, View};

pub use utils::time::{current_timestamp_nanos, TimeProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Shoulder range-of-motion kinematic analysis library".to_string(),
        features: vec![
            "Keypoint source abstraction".to_string(),
            "Per-view kinematic extraction".to_string(),
            "Keyframe selection and composite scoring".to_string(),
            "Cancellable background jobs".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
