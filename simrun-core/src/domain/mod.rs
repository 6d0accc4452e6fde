//! Core domain types
//!
//! This module contains the structures shared between the server (which
//! persists and runs jobs) and the client/CLI (which submit and inspect them).

pub mod document;
pub mod job;
pub mod params;
