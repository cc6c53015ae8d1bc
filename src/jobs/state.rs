// src/jobs/state.rs
//! Job lifecycle state machine

use serde::{Deserialize, Serialize};
use std::fmt;

/// `queued -> running -> {completed | stopped | error}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Stopped,
    Error,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Stopped | JobState::Error)
    }

    /// Whether `self -> next` is a legal transition. Terminal states never
    /// move and no state transitions to itself.
    pub fn can_transition_to(self, next: JobState) -> bool {
        match self {
            JobState::Queued => next == JobState::Running,
            JobState::Running => next.is_terminal(),
            JobState::Completed | JobState::Stopped | JobState::Error => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Stopped => "stopped",
            JobState::Error => "error",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgement returned by a cancellation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    /// The job will stop at its next checkpoint
    Requested,
    /// The job had already finished; nothing changed
    AlreadyTerminal(JobState),
}
