// src/jobs/cancel.rs
//! Cooperative cancellation shared between a job's submitter and its worker

use crate::error::{PipelineStage, RomErrorBuilder, RomResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable cancellation flag. Every clone observes the same request.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail with [`crate::RomError::Cancelled`] if cancellation was requested
    pub fn checkpoint(&self, stage: PipelineStage) -> RomResult<()> {
        if self.is_cancelled() {
            return Err(RomErrorBuilder::new("cancellation", "checkpoint").cancelled(stage));
        }
        Ok(())
    }
}
