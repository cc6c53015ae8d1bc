// src/error.rs
//! Unified error handling system for ROM Core
//!
//! Every boundary of the analysis pipeline (keypoint provider, video source,
//! result sinks, record store, configuration) has its own leaf error type.
//! All of them convert into [`RomError`], which carries an [`ErrorContext`]
//! describing where the failure happened and is the only error type the job
//! manager reasons about when deciding whether a fault is fatal.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::source::types::View;

/// Unified error type for the entire analysis pipeline
#[derive(Debug, Clone, thiserror::Error)]
pub enum RomError {
    /// Missing or unreadable input video. Aborts the affected view only.
    #[error("[INPUT] {view} video unavailable at {}: {reason} ({context})", .path.display())]
    InputNotFound {
        view: View,
        path: PathBuf,
        reason: String,
        context: ErrorContext,
    },

    /// The keypoint provider could not be brought up. Fatal for the job.
    #[error("[PROVIDER] keypoint provider failed to initialize: {reason} ({context})")]
    ProviderInit {
        reason: String,
        context: ErrorContext,
    },

    /// A single frame could not be decoded or inferred. The sample is skipped.
    #[error("[DECODE] {view} frame {frame}: {reason} ({context})")]
    FrameDecode {
        view: View,
        frame: u64,
        reason: String,
        context: ErrorContext,
    },

    /// Write-back to the record store failed after a completed analysis
    #[error("[PERSIST] {operation} failed: {reason} ({context})")]
    Persistence {
        operation: String,
        reason: String,
        context: ErrorContext,
    },

    /// A cancellation request was observed at a checkpoint
    #[error("[CANCELLED] job cancelled before {stage} ({context})")]
    Cancelled {
        stage: PipelineStage,
        context: ErrorContext,
    },

    /// Configuration and setup errors
    #[error("[CONFIG] configuration error in {component}: {reason} ({context})")]
    Configuration {
        component: String,
        reason: String,
        context: ErrorContext,
    },

    /// Invalid input data errors
    #[error("[DATA] invalid {data_type}: {reason} ({context})")]
    InvalidData {
        data_type: String,
        reason: String,
        context: ErrorContext,
    },

    /// Status lookup for an id the manager does not know (or already evicted)
    #[error("[JOB] job {job_id} not found ({context})")]
    JobNotFound {
        job_id: String,
        context: ErrorContext,
    },

    /// Resource exhaustion errors (queue full, manager shut down)
    #[error("[RESOURCE] {resource} exhausted: requested {requested}, limit {limit} ({context})")]
    ResourceExhausted {
        resource: ResourceType,
        limit: usize,
        requested: usize,
        context: ErrorContext,
    },

    /// Failure writing a result artifact (chart, still, document, data file)
    #[error("[OUTPUT] could not write {}: {reason} ({context})", .path.display())]
    Output {
        path: PathBuf,
        reason: String,
        context: ErrorContext,
    },

    /// System-level errors
    #[error("[SYSTEM] {subsystem} error: {reason} ({context})")]
    System {
        subsystem: String,
        reason: String,
        context: ErrorContext,
    },
}

/// Checkpoints at which a running job observes cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    ProviderInit,
    ViewStart,
    Frame,
    Charts,
    Scoring,
    Keyframes,
    Report,
    Persistence,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::ProviderInit => "provider-init",
            PipelineStage::ViewStart => "view-start",
            PipelineStage::Frame => "frame",
            PipelineStage::Charts => "charts",
            PipelineStage::Scoring => "scoring",
            PipelineStage::Keyframes => "keyframes",
            PipelineStage::Report => "report",
            PipelineStage::Persistence => "persistence",
        };
        f.write_str(name)
    }
}

/// Resource types for exhaustion tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    JobQueue,
    Workers,
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceType::JobQueue => write!(f, "job queue"),
            ResourceType::Workers => write!(f, "worker pool"),
        }
    }
}

/// Error context for debugging and analysis
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub timestamp: SystemTime,
    pub thread_name: Option<String>,
    pub component: String,
    pub operation: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
    pub additional_info: HashMap<String, String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            thread_name: std::thread::current().name().map(|s| s.to_string()),
            component: component.to_string(),
            operation: operation.to_string(),
            file: None,
            line: None,
            additional_info: HashMap::new(),
        }
    }

    /// Create error context with file and line information
    pub fn with_location(component: &str, operation: &str, file: &'static str, line: u32) -> Self {
        let mut context = Self::new(component, operation);
        context.file = Some(file);
        context.line = Some(line);
        context
    }

    /// Add additional information to the context
    pub fn add_info<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional_info.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.component, self.operation)?;
        if let (Some(file), Some(line)) = (self.file, self.line) {
            write!(f, " at {}:{}", file, line)?;
        }
        Ok(())
    }
}

/// Macro for creating error context with file and line info
#[macro_export]
macro_rules! error_context {
    ($component:expr, $operation:expr) => {
        $crate::error::ErrorContext::with_location($component, $operation, file!(), line!())
    };
}

impl RomError {
    /// Whether this error must abort the whole job.
    ///
    /// Per-frame and per-view faults are recovered where they happen, and a
    /// persistence failure after analysis only degrades the result to a
    /// warning. Everything else reaching the worker ends the job.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            RomError::InputNotFound { .. }
                | RomError::FrameDecode { .. }
                | RomError::Persistence { .. }
                | RomError::Cancelled { .. }
        )
    }

    /// Whether this error is a cancellation observed at a checkpoint
    pub fn is_cancellation(&self) -> bool {
        matches!(self, RomError::Cancelled { .. })
    }

    /// Context attached to this error
    pub fn context(&self) -> &ErrorContext {
        match self {
            RomError::InputNotFound { context, .. }
            | RomError::ProviderInit { context, .. }
            | RomError::FrameDecode { context, .. }
            | RomError::Persistence { context, .. }
            | RomError::Cancelled { context, .. }
            | RomError::Configuration { context, .. }
            | RomError::InvalidData { context, .. }
            | RomError::JobNotFound { context, .. }
            | RomError::ResourceExhausted { context, .. }
            | RomError::Output { context, .. }
            | RomError::System { context, .. } => context,
        }
    }
}

/// Conversion from keypoint provider errors
impl From<crate::source::ProviderError> for RomError {
    fn from(err: crate::source::ProviderError) -> Self {
        RomError::ProviderInit {
            reason: err.to_string(),
            context: error_context!("keypoint_provider", "initialize"),
        }
    }
}

/// Conversion from result sink errors
impl From<crate::report::SinkError> for RomError {
    fn from(err: crate::report::SinkError) -> Self {
        let context = error_context!("report", "write_artifact");
        match err {
            crate::report::SinkError::Io { path, reason } => RomError::Output { path, reason, context },
            other => RomError::Output {
                path: PathBuf::new(),
                reason: other.to_string(),
                context,
            },
        }
    }
}

/// Conversion from record store errors
impl From<crate::report::StoreError> for RomError {
    fn from(err: crate::report::StoreError) -> Self {
        RomError::Persistence {
            operation: "record_store".to_string(),
            reason: err.to_string(),
            context: error_context!("record_store", "access"),
        }
    }
}

/// Conversion from configuration loading errors
impl From<crate::config::ConfigError> for RomError {
    fn from(err: crate::config::ConfigError) -> Self {
        RomError::Configuration {
            component: "config_loader".to_string(),
            reason: err.to_string(),
            context: error_context!("config", "load"),
        }
    }
}

/// Result type alias for ROM operations
pub type RomResult<T> = Result<T, RomError>;

/// Error builder for convenient error construction
pub struct RomErrorBuilder {
    component: String,
    operation: String,
}

impl RomErrorBuilder {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
        }
    }

    fn context(&self) -> ErrorContext {
        ErrorContext::new(&self.component, &self.operation)
    }

    pub fn configuration(self, reason: &str) -> RomError {
        let context = self.context();
        RomError::Configuration {
            component: self.component,
            reason: reason.to_string(),
            context,
        }
    }

    pub fn invalid_data(self, data_type: &str, reason: &str) -> RomError {
        RomError::InvalidData {
            data_type: data_type.to_string(),
            reason: reason.to_string(),
            context: self.context(),
        }
    }

    pub fn cancelled(self, stage: PipelineStage) -> RomError {
        RomError::Cancelled {
            stage,
            context: self.context(),
        }
    }

    pub fn job_not_found(self, job_id: impl fmt::Display) -> RomError {
        RomError::JobNotFound {
            job_id: job_id.to_string(),
            context: self.context(),
        }
    }

    pub fn resource_exhausted(self, resource: ResourceType, limit: usize, requested: usize) -> RomError {
        RomError::ResourceExhausted {
            resource,
            limit,
            requested,
            context: self.context(),
        }
    }

    pub fn input_not_found(self, view: View, path: impl Into<PathBuf>, reason: &str) -> RomError {
        RomError::InputNotFound {
            view,
            path: path.into(),
            reason: reason.to_string(),
            context: self.context(),
        }
    }
}

/// Convenience trait for error building
pub trait IntoRomError<T> {
    fn rom_err(self, component: &str, operation: &str) -> RomResult<T>;
}

impl<T, E> IntoRomError<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn rom_err(self, component: &str, operation: &str) -> RomResult<T> {
        self.map_err(|err| RomError::System {
            subsystem: component.to_string(),
            reason: err.to_string(),
            context: ErrorContext::new(component, operation),
        })
    }
}
