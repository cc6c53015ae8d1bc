// src/source/traits.rs
//! Boundary traits for the pose-estimation provider and video decoding

use crate::source::types::{DetectedSubject, Frame};
use std::path::{Path, PathBuf};

/// Keypoint provider errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
}

/// Video source errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum VideoError {
    #[error("video not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("cannot open video {}: {reason}", .path.display())]
    Open { path: PathBuf, reason: String },
    #[error("frame {frame} could not be decoded: {reason}")]
    Decode { frame: u64, reason: String },
    #[error("seek to frame {frame} failed: {reason}")]
    Seek { frame: u64, reason: String },
}

/// Pose-estimation model wrapped behind a per-frame inference call
pub trait KeypointProvider: Send {
    /// Detect subjects in `frame`, dropping detections below
    /// `confidence_threshold` and suppressing boxes overlapping above
    /// `overlap_threshold`.
    fn infer(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
        overlap_threshold: f32,
    ) -> Result<Vec<DetectedSubject>, ProviderError>;
}

/// Creates one provider instance per job
pub trait ProviderFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn KeypointProvider>, ProviderError>;
}

/// Sequentially decodable video with random-access seek
pub trait VideoSource: Send {
    /// Frames per second reported by the container
    fn fps(&self) -> f64;

    /// Total number of frames in the container
    fn frame_count(&self) -> u64;

    /// Position the decoder so the next `read_frame` returns frame `index`
    fn seek(&mut self, index: u64) -> Result<(), VideoError>;

    /// Decode the next frame. `Ok(None)` marks end of stream. A decode error
    /// still consumes the frame it failed on.
    fn read_frame(&mut self) -> Result<Option<Frame>, VideoError>;
}

/// Opens video files by path
pub trait VideoOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, VideoError>;
}
