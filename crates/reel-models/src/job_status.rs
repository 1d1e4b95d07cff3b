//! Generation job status.

use serde::{Deserialize, Serialize};

/// Status of a generation job on the backend.
///
/// Monotonic per job: once `Succeeded` or `Failed`, it never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Queued, throttled or running
    #[default]
    Pending,
    /// Finished with output
    Succeeded,
    /// Finished without output (failed or cancelled)
    Failed,
}

impl JobStatus {
    /// Map a backend status string.
    ///
    /// Transient states (`PENDING`, `THROTTLED`, `RUNNING`) and anything
    /// unrecognised map to `Pending`; `CANCELLED` is terminal.
    pub fn from_backend(status: &str) -> Self {
        match status.trim().to_ascii_uppercase().as_str() {
            "SUCCEEDED" => JobStatus::Succeeded,
            "FAILED" | "CANCELLED" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
