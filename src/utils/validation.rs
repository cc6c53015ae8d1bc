// src/utils/validation.rs
//! Input video file validation

use crate::config::InputSettings;
use std::path::Path;

/// Validation result type
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Reasons an input file is rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("file does not exist")]
    Missing,
    #[error("path is not a regular file")]
    NotAFile,
    #[error("unsupported extension '{extension}', expected one of {allowed:?}")]
    UnsupportedExtension { extension: String, allowed: Vec<String> },
    #[error("file size {actual} bytes exceeds limit of {max} bytes")]
    TooLarge { actual: u64, max: u64 },
    #[error("cannot read file metadata: {0}")]
    Unreadable(String),
}

/// Check that `path` is an existing video with an accepted extension and size
pub fn validate_video_file(path: &Path, settings: &InputSettings) -> ValidationResult<u64> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ValidationError::Missing),
        Err(e) => return Err(ValidationError::Unreadable(e.to_string())),
    };
    if !metadata.is_file() {
        return Err(ValidationError::NotAFile);
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !settings
        .allowed_extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&extension))
    {
        return Err(ValidationError::UnsupportedExtension {
            extension,
            allowed: settings.allowed_extensions.clone(),
        });
    }

    let max = settings.max_file_size_bytes();
    if metadata.len() > max {
        return Err(ValidationError::TooLarge {
            actual: metadata.len(),
            max,
        });
    }
    Ok(metadata.len())
}
