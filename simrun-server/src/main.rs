//! Simrun Server
//!
//! HTTP front end for an external simulation: accepts parameters, writes
//! them as a YAML configuration document, runs the simulation against it and
//! relays the result text and output files back.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod repository;
pub mod runner;
pub mod service;

use crate::config::Config;
use crate::runner::ProcessRunner;
use crate::service::JobService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "simrun_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Simrun server...");

    let config = load_config()?;
    tracing::info!(
        "Project root: {}, simulation: {} {}",
        config.project_root.display(),
        config.interpreter,
        config.script.display()
    );
    tracing::info!(
        "Job isolation: {}, parallel jobs: {}, default timeout: {:?}",
        config.isolate_jobs,
        config.effective_parallelism(),
        config.job_timeout
    );

    let script = config.script_path();
    if !script.is_file() {
        tracing::warn!(
            "Simulation script {} not found; runs will report it as unavailable",
            script.display()
        );
    }

    let runner = Arc::new(ProcessRunner::new(config.interpreter.clone(), script));
    let addr = config.bind_addr.clone();
    let service = JobService::new(Arc::new(config), runner);

    // Build router with all API endpoints
    let app = api::create_router(service);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}

/// Loads and validates configuration from the environment
///
/// The project root is made absolute because simulations run inside job
/// workspaces, not in the server's working directory.
fn load_config() -> Result<Config> {
    let mut config = Config::from_env();
    config.validate()?;

    config.project_root = std::fs::canonicalize(&config.project_root).with_context(|| {
        format!(
            "Project root {} is not accessible",
            config.project_root.display()
        )
    })?;

    Ok(config)
}
