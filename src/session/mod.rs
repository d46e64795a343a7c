//! Ingestion session: state machine, mode policy and upload hand-off

use crate::domain::UploadMode;
use crate::ingest::artifact::ArtifactPolicy;
use crate::ingest::traversal::{TraversalOptions, TraversalReport};
use std::fmt;
use std::time::Duration;

pub mod controller;
pub mod progress;

pub use controller::IngestionController;
pub use progress::{ProgressReporter, PROGRESS_CAP, PROGRESS_DONE};

/// Runtime knobs for a session.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: UploadMode,
    pub artifacts: ArtifactPolicy,
    pub traversal: TraversalOptions,
    /// How long `Completed` stays observable before the session resets.
    pub completion_linger: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: UploadMode::default(),
            artifacts: ArtifactPolicy::default(),
            traversal: TraversalOptions::default(),
            completion_linger: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Selecting,
    Uploading,
    Completed,
    Failed,
    Cancelled,
}

impl SessionState {
    pub fn accepts_ingest(&self) -> bool {
        matches!(self, SessionState::Idle | SessionState::Selecting | SessionState::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Selecting => "selecting",
            SessionState::Uploading => "uploading",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
            SessionState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot published to observers on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    /// Upload progress in percent, never decreasing within one upload.
    pub progress: u8,
    pub selected: usize,
    pub total_bytes: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(
        "batch rejected: '{offending}' carries folder structure but the session is in {mode} mode"
    )]
    PolicyViolation { mode: UploadMode, offending: String },

    #[error("nothing selected to upload")]
    EmptySelection,

    #[error("session is busy ({state})")]
    Busy { state: SessionState },

    #[error("upload failed")]
    UploadFailed,

    #[error("session was reset before the operation finished")]
    Cancelled,
}

/// Summary of one ingestion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub accepted: usize,
    pub duplicates: usize,
    pub artifacts: usize,
    pub fallbacks: usize,
    pub degraded: bool,
    pub traversal: TraversalReport,
}
