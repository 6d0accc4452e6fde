//! Configuration module
//!
//! Handles CLI configuration including the server URL.

use simrun_client::SimrunClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the simrun server
    pub server_url: String,
}

impl Config {
    /// Build a client pointed at the configured server
    pub fn client(&self) -> SimrunClient {
        SimrunClient::new(&self.server_url)
    }
}
