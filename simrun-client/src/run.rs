//! Form endpoints: run a simulation and read back its outputs

use reqwest::header;
use simrun_core::domain::params::Parameters;
use simrun_core::dto::job::RunOutput;

use crate::SimrunClient;
use crate::error::{ClientError, Result};

/// A downloaded artifact
#[derive(Debug, Clone)]
pub struct Download {
    /// File name announced by the server
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl SimrunClient {
    /// Run a simulation and wait for its result text
    ///
    /// # Returns
    /// The result text on success; `ClientError::SimulationFailed` with the
    /// relayed output when the simulation failed or could not be started
    pub async fn run(&self, parameters: &Parameters) -> Result<String> {
        let url = format!("{}/run", self.base_url);
        let response = self.client.post(&url).json(parameters).send().await?;

        if response.status() == reqwest::StatusCode::INTERNAL_SERVER_ERROR {
            let text = response.text().await?;
            return match serde_json::from_str::<RunOutput>(&text) {
                Ok(body) => Err(ClientError::SimulationFailed(body.output)),
                Err(_) => Err(ClientError::api_error(500, text)),
            };
        }

        let body: RunOutput = self.handle_response(response).await?;
        Ok(body.output)
    }

    /// Get the configuration document of the most recent run
    ///
    /// When nothing has been written yet the server answers with a short
    /// explanatory text instead, which is returned as is.
    pub async fn view_config(&self) -> Result<String> {
        let url = format!("{}/view-config", self.base_url);
        let response = self.client.get(&url).send().await?;

        let response = self.ensure_success(response).await?;
        Ok(response.text().await?)
    }

    /// Download the latest artifact of the most recent run
    ///
    /// # Returns
    /// `None` when the server has no artifact to offer
    pub async fn download_latest(&self) -> Result<Option<Download>> {
        let url = format!("{}/download", self.base_url);
        let response = self.client.get(&url).send().await?;

        let response = self.ensure_success(response).await?;
        let Some(file_name) = attachment_name(&response) else {
            tracing::debug!("No artifact available: {}", response.text().await?);
            return Ok(None);
        };

        let bytes = response.bytes().await?.to_vec();
        Ok(Some(Download { file_name, bytes }))
    }

    /// Read an attachment response into a `Download`
    pub(crate) async fn read_attachment(&self, response: reqwest::Response) -> Result<Download> {
        let response = self.ensure_success(response).await?;
        let file_name = attachment_name(&response).ok_or_else(|| {
            ClientError::ParseError("Response is not a file attachment".to_string())
        })?;

        let bytes = response.bytes().await?.to_vec();
        Ok(Download { file_name, bytes })
    }
}

/// File name from a `Content-Disposition: attachment; filename="..."` header
fn attachment_name(response: &reqwest::Response) -> Option<String> {
    let value = response.headers().get(header::CONTENT_DISPOSITION)?;
    parse_attachment_name(value.to_str().ok()?)
}

fn parse_attachment_name(disposition: &str) -> Option<String> {
    if !disposition.trim_start().starts_with("attachment") {
        return None;
    }

    disposition.split(';').find_map(|part| {
        let value = part.trim().strip_prefix("filename=")?;
        let name = value.trim_matches('"');
        // Never let a server pick a path outside the target directory
        let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
        (!name.is_empty() && name != "..").then(|| name.to_string())
    })
}
