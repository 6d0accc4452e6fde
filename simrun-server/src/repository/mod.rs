//! Repository Module
//!
//! Data access layer for the server.
//! - `job`: in-memory registry of submitted jobs
//! - `workspace`: configuration documents and simulation outputs on disk

pub mod job;
pub mod workspace;

// Re-export for convenience
pub use job::JobRepository;
pub use workspace as workspace_repository;
