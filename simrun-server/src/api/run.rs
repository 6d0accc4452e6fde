//! Form API Handlers
//!
//! The endpoints used by the landing page: run a simulation and wait for it,
//! download its latest artifact, show its configuration document.
//!
//! Response shapes are kept for existing callers: `/run` answers
//! `{"output": ...}` even on failure, while the two read endpoints answer
//! plain text when there is nothing to show.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use simrun_core::domain::job::JobStatus;
use simrun_core::domain::params::Parameters;
use simrun_core::dto::job::RunOutput;

use crate::api::attachment;
use crate::service::JobService;

/// POST /run
/// Run a simulation with the submitted parameters and return its result text
pub async fn run_simulation(
    State(service): State<JobService>,
    payload: Result<Json<Parameters>, JsonRejection>,
) -> Response {
    let Json(parameters) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected run request: {}", rejection.body_text());
            return (rejection.status(), Json(RunOutput::new(rejection.body_text())))
                .into_response();
        }
    };

    tracing::info!("Running simulation with {} parameter(s)", parameters.len());

    match service.run(parameters).await {
        Ok(job) => {
            let status = if job.status == JobStatus::Succeeded {
                StatusCode::OK
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            let output = job.outcome.map(|o| o.output).unwrap_or_default();
            (status, Json(RunOutput::new(output))).into_response()
        }
        Err(e) => {
            tracing::error!("Simulation run failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RunOutput::new(e.to_string())),
            )
                .into_response()
        }
    }
}

/// GET /download
/// Download the latest artifact of the most recent run
pub async fn download_latest(State(service): State<JobService>) -> Response {
    let Some(workspace) = service.latest_workspace().await else {
        return service.missing_artifact_message().into_response();
    };

    match service.latest_artifact(&workspace).await {
        Ok(Some(path)) => match attachment::send_file(&path).await {
            Ok(response) => response,
            Err(e) => e.into_response(),
        },
        Ok(None) => service.missing_artifact_message().into_response(),
        Err(e) => {
            tracing::error!("Failed to look up artifacts: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// GET /view-config
/// Show the configuration document of the most recent run
pub async fn view_config(State(service): State<JobService>) -> Response {
    let Some(workspace) = service.latest_workspace().await else {
        return service.missing_config_message().into_response();
    };

    match service.config_document(&workspace).await {
        Ok(Some(document)) => document.into_response(),
        Ok(None) => service.missing_config_message().into_response(),
        Err(e) => {
            tracing::error!("Failed to read configuration document: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
