//! Simrun HTTP Client
//!
//! A small, type-safe HTTP client for the Simrun server API.
//!
//! # Example
//!
//! ```no_run
//! use simrun_client::SimrunClient;
//! use simrun_core::domain::params::Parameters;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), simrun_client::ClientError> {
//!     let client = SimrunClient::new("http://localhost:8080");
//!
//!     let mut parameters = Parameters::new();
//!     parameters.insert("discount_rate".to_string(), 5.into());
//!
//!     let output = client.run(&parameters).await?;
//!     println!("{}", output);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;
mod run;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use run::Download;

use reqwest::Client;
use serde::de::DeserializeOwned;
use simrun_core::dto::job::ErrorBody;

/// HTTP client for the Simrun server API
///
/// Methods are organized into two groups:
/// - Form endpoints (run, download, view-config)
/// - Job lifecycle (submit, inspect, cancel, per-job outputs)
#[derive(Debug, Clone)]
pub struct SimrunClient {
    /// Base URL of the server (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl SimrunClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the server (e.g., "http://localhost:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    /// Note that `run` waits for the whole simulation, so a request timeout
    /// shorter than the simulation will abort it on the client side.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the server is up
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.ensure_success(response).await.map(|_| ())
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.ensure_success(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Turn a non-success status into an error, using the `{"error"}` body when present
    async fn ensure_success(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ErrorBody>(&error_text)
            .map(|body| body.error)
            .unwrap_or(error_text);

        tracing::debug!("Request failed with status {}: {}", status, message);

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(message));
        }
        Err(ClientError::api_error(status.as_u16(), message))
    }
}
