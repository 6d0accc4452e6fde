//! Simrun Core
//!
//! Core types and pure logic shared by the Simrun services.
//!
//! This crate contains:
//! - Domain types: simulation parameters, the configuration document, jobs
//! - DTOs: Data transfer objects exchanged over HTTP

pub mod domain;
pub mod dto;
