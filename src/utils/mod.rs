// src/utils/mod.rs
//! Common utilities: clocks, input validation and output folder layout

pub mod paths;
pub mod time;
pub mod validation;

pub use paths::{sanitize_component, SubjectFolders};
pub use time::{current_timestamp_nanos, MockTimeProvider, SystemTimeProvider, TimeProvider};
pub use validation::{validate_video_file, ValidationError, ValidationResult};
