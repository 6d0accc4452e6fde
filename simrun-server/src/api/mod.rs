//! API Module
//!
//! HTTP API layer for the server.
//! - `run`: form endpoints used by the landing page (`/run`, `/download`, `/view-config`)
//! - `job`: asynchronous job endpoints under `/jobs`

pub mod attachment;
pub mod error;
pub mod health;
pub mod index;
pub mod job;
pub mod run;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::service::JobService;

/// Create the main API router with all endpoints
pub fn create_router(service: JobService) -> Router {
    Router::new()
        // Landing page and health check
        .route("/", get(index::index))
        .route("/health", get(health::health_check))
        // Form endpoints
        .route("/run", post(run::run_simulation))
        .route("/download", get(run::download_latest))
        .route("/view-config", get(run::view_config))
        // Job endpoints
        .route("/jobs", post(job::submit_job).get(job::list_jobs))
        .route("/jobs/{id}", get(job::get_job))
        .route("/jobs/{id}/cancel", post(job::cancel_job))
        .route("/jobs/{id}/config", get(job::get_job_config))
        .route("/jobs/{id}/result", get(job::get_job_result))
        .route("/jobs/{id}/download", get(job::download_job_artifact))
        // Add state and middleware
        .with_state(service)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
