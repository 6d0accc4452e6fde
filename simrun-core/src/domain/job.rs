//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::params::Parameters;

/// Simulation job record
///
/// Structure shared between the server (owns and updates it) and clients (read it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub requested_at: chrono::DateTime<chrono::Utc>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Normalized parameters, exactly as written to the configuration document
    pub parameters: Parameters,
    pub timeout_seconds: Option<u64>,
    pub outcome: Option<JobOutcome>,
}

impl Job {
    /// Creates a queued job
    pub fn new(parameters: Parameters, timeout_seconds: Option<u64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            requested_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
            parameters,
            timeout_seconds,
            outcome: None,
        }
    }
}

/// Job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    /// The simulation ran and exited non-zero
    Failed,
    /// The interpreter or script could not be launched at all
    Unavailable,
    Cancelled,
    TimedOut,
}

impl JobStatus {
    /// Whether the job has finished and will never change again
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Queued | JobStatus::Running)
    }
}

/// Final result of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub success: bool,
    /// Exit code of the simulation process, when it ran to completion
    pub exit_code: Option<i32>,
    /// Result text on success, diagnostic message otherwise
    pub output: String,
}
