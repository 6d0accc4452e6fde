//! Job API Handlers
//!
//! HTTP endpoints for asynchronous jobs: submit, inspect, cancel, and
//! retrieve per-job outputs.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use simrun_core::domain::job::Job;
use simrun_core::domain::params::Parameters;
use simrun_core::dto::job::{RunOutput, SubmitOptions};
use uuid::Uuid;

use crate::api::attachment;
use crate::api::error::{ApiError, ApiResult};
use crate::service::JobService;

/// POST /jobs
/// Queue a new simulation job
pub async fn submit_job(
    State(service): State<JobService>,
    Query(options): Query<SubmitOptions>,
    payload: Result<Json<Parameters>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    let Json(parameters) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    tracing::info!("Submitting job with {} parameter(s)", parameters.len());

    let job = service.submit(parameters, options.timeout_seconds).await?;

    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// GET /jobs
/// List all jobs, newest first
pub async fn list_jobs(State(service): State<JobService>) -> Json<Vec<Job>> {
    tracing::debug!("Listing all jobs");

    Json(service.list_jobs().await)
}

/// GET /jobs/{id}
/// Get job details by ID
pub async fn get_job(
    State(service): State<JobService>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Job>> {
    tracing::debug!("Getting job: {}", id);

    Ok(Json(service.get_job(id).await?))
}

/// POST /jobs/{id}/cancel
/// Request cancellation of a queued or running job
pub async fn cancel_job(
    State(service): State<JobService>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<Job>)> {
    tracing::info!("Cancelling job: {}", id);

    let job = service.cancel_job(id).await?;

    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// GET /jobs/{id}/config
/// Get the configuration document written for a job
pub async fn get_job_config(
    State(service): State<JobService>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RunOutput>> {
    tracing::debug!("Getting configuration for job: {}", id);

    let workspace = service.job_workspace(id).await?;
    let document = service
        .config_document(&workspace)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Configuration for job {} not written yet", id))
        })?;

    Ok(Json(RunOutput::new(document)))
}

/// GET /jobs/{id}/result
/// Get the result text of a job
pub async fn get_job_result(
    State(service): State<JobService>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<RunOutput>> {
    tracing::debug!("Getting result for job: {}", id);

    let workspace = service.job_workspace(id).await?;
    let text = service.result_text(&workspace).await?;

    Ok(Json(RunOutput::new(text)))
}

/// GET /jobs/{id}/download
/// Download the latest artifact of a job
pub async fn download_job_artifact(
    State(service): State<JobService>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    tracing::debug!("Downloading artifact for job: {}", id);

    let workspace = service.job_workspace(id).await?;
    let path = service
        .latest_artifact(&workspace)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No artifact found for job {}", id)))?;

    attachment::send_file(&path).await
}
