// src/jobs/mod.rs
//! Asynchronous analysis jobs: submission, status polling, cooperative
//! cancellation and a bounded pool of worker threads

pub mod cancel;
pub mod manager;
pub mod state;
pub mod types;
mod worker;

pub use cancel::CancellationToken;
pub use manager::{JobManager, JobServices};
pub use state::{CancelOutcome, JobState};
pub use types::{AnalysisConfig, AnalysisRequest, JobId, JobResult, JobSnapshot};
