//! Job-related API endpoints

use simrun_core::domain::job::Job;
use simrun_core::domain::params::Parameters;
use simrun_core::dto::job::RunOutput;
use std::time::Duration;
use uuid::Uuid;

use crate::SimrunClient;
use crate::error::Result;
use crate::run::Download;

impl SimrunClient {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Queue a new simulation job
    ///
    /// # Arguments
    /// * `parameters` - Simulation parameters
    /// * `timeout_seconds` - Optional time limit overriding the server default (0 = none)
    ///
    /// # Returns
    /// The queued job
    pub async fn submit_job(
        &self,
        parameters: &Parameters,
        timeout_seconds: Option<u64>,
    ) -> Result<Job> {
        let url = format!("{}/jobs", self.base_url);
        let mut request = self.client.post(&url).json(parameters);
        if let Some(secs) = timeout_seconds {
            request = request.query(&[("timeout_seconds", secs)]);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// Get a job by ID
    pub async fn get_job(&self, job_id: Uuid) -> Result<Job> {
        let url = format!("{}/jobs/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List all jobs, newest first
    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let url = format!("{}/jobs", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Request cancellation of a queued or running job
    ///
    /// # Returns
    /// The job as it was when the request arrived; cancellation completes asynchronously
    pub async fn cancel_job(&self, job_id: Uuid) -> Result<Job> {
        let url = format!("{}/jobs/{}/cancel", self.base_url, job_id);
        let response = self.client.post(&url).send().await?;

        self.handle_response(response).await
    }

    /// Poll a job until it reaches a terminal status
    ///
    /// # Arguments
    /// * `job_id` - The job to wait for
    /// * `poll_interval` - Delay between status checks
    pub async fn wait_for_job(&self, job_id: Uuid, poll_interval: Duration) -> Result<Job> {
        loop {
            let job = self.get_job(job_id).await?;
            if job.status.is_terminal() {
                return Ok(job);
            }

            tracing::debug!("Job {} is {:?}, polling again", job_id, job.status);
            tokio::time::sleep(poll_interval).await;
        }
    }

    // =============================================================================
    // Job Outputs
    // =============================================================================

    /// Get the configuration document written for a job
    pub async fn job_config(&self, job_id: Uuid) -> Result<String> {
        let url = format!("{}/jobs/{}/config", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        let body: RunOutput = self.handle_response(response).await?;
        Ok(body.output)
    }

    /// Get the result text of a job
    pub async fn job_result(&self, job_id: Uuid) -> Result<String> {
        let url = format!("{}/jobs/{}/result", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        let body: RunOutput = self.handle_response(response).await?;
        Ok(body.output)
    }

    /// Download the latest artifact of a job
    pub async fn download_job_artifact(&self, job_id: Uuid) -> Result<Download> {
        let url = format!("{}/jobs/{}/download", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        self.read_attachment(response).await
    }
}
