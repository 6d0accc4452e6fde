//! Job DTOs for client/server communication

use serde::{Deserialize, Serialize};

/// Text payload returned by the run, config and result endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutput {
    pub output: String,
}

impl RunOutput {
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
        }
    }
}

/// Query options accepted when submitting a job
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Overrides the server's default timeout for this job
    pub timeout_seconds: Option<u64>,
}

/// Error body returned by the job API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
