//! Service Module
//!
//! Business logic layer for the server.
//! Services orchestrate between repositories and the simulation runner.

pub mod job;

// Re-export for convenience
pub use job::{JobError, JobService};
