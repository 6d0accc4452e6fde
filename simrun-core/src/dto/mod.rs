//! Data Transfer Objects
//!
//! Request and response bodies exchanged between the server and its clients.

pub mod job;
