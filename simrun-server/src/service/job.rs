//! Job Service
//!
//! Drives a submission through its whole life:
//! normalize parameters → render the configuration document → wait for a
//! free slot → write the document → run the simulation → collect the result.

use simrun_core::domain::document::{self, DocumentError};
use simrun_core::domain::job::{Job, JobOutcome, JobStatus};
use simrun_core::domain::params::{self, Parameters};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Notify, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::repository::workspace::WorkspaceError;
use crate::repository::{JobRepository, workspace_repository};
use crate::runner::{Invocation, RunOutcome, SimulationRunner};

/// Service error type
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job {0} not found")]
    NotFound(Uuid),

    #[error("{0}")]
    InvalidState(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("Job {0} execution task failed: {1}")]
    Execution(Uuid, String),
}

/// Job orchestration service
///
/// Cheap to clone; clones share the registry, the runner and the slots.
#[derive(Clone)]
pub struct JobService {
    config: Arc<Config>,
    jobs: Arc<JobRepository>,
    runner: Arc<dyn SimulationRunner>,
    slots: Arc<Semaphore>,
}

/// How the simulation phase of a job ended
enum Finished {
    Run(RunOutcome),
    TimedOut(Duration),
    Cancelled,
}

impl JobService {
    pub fn new(config: Arc<Config>, runner: Arc<dyn SimulationRunner>) -> Self {
        let slots = Arc::new(Semaphore::new(config.effective_parallelism()));
        Self {
            config,
            jobs: Arc::new(JobRepository::new()),
            runner,
            slots,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =============================================================================
    // Submission
    // =============================================================================

    /// Queue a job and run it in the background
    pub async fn submit(
        &self,
        parameters: Parameters,
        timeout_seconds: Option<u64>,
    ) -> Result<Job, JobError> {
        let (job, _handle) = self.launch(parameters, timeout_seconds).await?;
        Ok(job)
    }

    /// Submit a job and wait until it is finished
    ///
    /// The job runs in its own task, so it still completes if the caller
    /// stops waiting.
    pub async fn run(&self, parameters: Parameters) -> Result<Job, JobError> {
        let (job, handle) = self.launch(parameters, None).await?;
        handle
            .await
            .map_err(|e| JobError::Execution(job.id, e.to_string()))
    }

    async fn launch(
        &self,
        parameters: Parameters,
        timeout_seconds: Option<u64>,
    ) -> Result<(Job, JoinHandle<Job>), JobError> {
        let parameters = params::normalize(parameters);
        let document = document::render(&parameters)?;

        let timeout_seconds = match timeout_seconds {
            Some(0) => None,
            Some(secs) => Some(secs),
            None => self.config.job_timeout.map(|d| d.as_secs()),
        };

        let job = Job::new(parameters, timeout_seconds);
        let cancel = self.jobs.insert(job.clone()).await;

        info!(
            "Job {} queued with {} parameter(s)",
            job.id,
            job.parameters.len()
        );

        let service = self.clone();
        let id = job.id;
        let timeout = timeout_seconds.map(Duration::from_secs);
        let handle =
            tokio::spawn(async move { service.execute(id, document, cancel, timeout).await });

        Ok((job, handle))
    }

    // =============================================================================
    // Execution
    // =============================================================================

    async fn execute(
        &self,
        id: Uuid,
        document: String,
        cancel: Arc<Notify>,
        timeout: Option<Duration>,
    ) -> Job {
        let permit = tokio::select! {
            _ = cancel.notified() => {
                info!("Job {} cancelled before it started", id);
                return self.finish(id, JobStatus::Cancelled, None, cancelled_message()).await;
            }
            permit = self.slots.clone().acquire_owned() => permit,
        };
        let Ok(_permit) = permit else {
            return self
                .finish(id, JobStatus::Failed, None, "Job slots are closed".to_string())
                .await;
        };

        self.jobs.update_status_to_running(id).await;
        info!("Job {} started", id);

        let workspace = self.config.workspace_for(id);
        let invocation = Invocation {
            job_id: id,
            config_file: self.config.config_file_in(&workspace),
            results_dir: self.config.results_dir_in(&workspace),
            workspace: workspace.clone(),
        };

        if let Err(e) = workspace_repository::write_config(&invocation.config_file, &document).await
        {
            error!("Job {}: {}", id, e);
            return self
                .finish(
                    id,
                    JobStatus::Failed,
                    None,
                    format!("Failed to write configuration: {}", e),
                )
                .await;
        }
        debug!(
            "{} contents:\n{}",
            invocation.config_file.display(),
            document
        );

        let finished = tokio::select! {
            _ = cancel.notified() => Finished::Cancelled,
            finished = run_with_timeout(self.runner.as_ref(), &invocation, timeout) => finished,
        };

        match finished {
            Finished::Run(RunOutcome::Succeeded) => match self.result_text(&workspace).await {
                Ok(text) => self.finish(id, JobStatus::Succeeded, Some(0), text).await,
                Err(e) => {
                    error!("Job {}: {}", id, e);
                    self.finish(
                        id,
                        JobStatus::Failed,
                        Some(0),
                        format!("Failed to read results: {}", e),
                    )
                    .await
                }
            },
            Finished::Run(RunOutcome::Failed { exit_code, output }) => {
                self.finish(
                    id,
                    JobStatus::Failed,
                    exit_code,
                    format!("{} model error:\n{}", self.config.model_name(), output),
                )
                .await
            }
            Finished::Run(RunOutcome::Unavailable { message }) => {
                self.finish(id, JobStatus::Unavailable, None, message).await
            }
            Finished::TimedOut(limit) => {
                warn!("Job {} timed out after {:?}", id, limit);
                self.finish(
                    id,
                    JobStatus::TimedOut,
                    None,
                    format!("Simulation timed out after {}s", limit.as_secs()),
                )
                .await
            }
            Finished::Cancelled => {
                info!("Job {} cancelled while running", id);
                self.finish(id, JobStatus::Cancelled, None, cancelled_message())
                    .await
            }
        }
    }

    async fn finish(
        &self,
        id: Uuid,
        status: JobStatus,
        exit_code: Option<i32>,
        output: String,
    ) -> Job {
        let outcome = JobOutcome {
            success: status == JobStatus::Succeeded,
            exit_code,
            output,
        };

        info!("Job {} finished with status: {:?}", id, status);

        let completed = self.jobs.complete(id, status, outcome.clone()).await;
        self.evict_finished_jobs().await;

        match completed {
            Some(job) => job,
            None => {
                // Only finished jobs are evicted
                error!("Job {} vanished from the registry", id);
                Job {
                    id,
                    status,
                    outcome: Some(outcome),
                    ..Job::new(Parameters::new(), None)
                }
            }
        }
    }

    /// Drop the oldest finished jobs beyond the retention limit, with their workspaces
    async fn evict_finished_jobs(&self) {
        let keep = self.config.max_retained_jobs;
        if keep == 0 {
            return;
        }

        for id in self.jobs.evict_finished(keep).await {
            debug!("Evicted job {}", id);
            if !self.config.isolate_jobs {
                continue;
            }

            let workspace = self.config.workspace_for(id);
            if let Err(e) = workspace_repository::remove_workspace(&workspace).await {
                warn!("Job {}: {}", id, e);
            }
        }
    }

    // =============================================================================
    // Queries
    // =============================================================================

    /// Get a job by ID
    pub async fn get_job(&self, id: Uuid) -> Result<Job, JobError> {
        self.jobs.find_by_id(id).await.ok_or(JobError::NotFound(id))
    }

    /// List all jobs, newest first
    pub async fn list_jobs(&self) -> Vec<Job> {
        self.jobs.list_all().await
    }

    /// Request cancellation of a queued or running job
    ///
    /// Cancellation is asynchronous; the returned record may still show the
    /// job as queued or running.
    pub async fn cancel_job(&self, id: Uuid) -> Result<Job, JobError> {
        let job = self.get_job(id).await?;

        if job.status.is_terminal() {
            return Err(JobError::InvalidState(format!(
                "Cannot cancel job {} in state {:?}",
                id, job.status
            )));
        }

        if let Some(signal) = self.jobs.cancel_signal(id).await {
            signal.notify_one();
            info!("Cancellation requested for job {}", id);
        }

        Ok(job)
    }

    /// Workspace of the most recent submission
    ///
    /// In shared mode this is always the project root, which may hold the
    /// output of an earlier server process.
    pub async fn latest_workspace(&self) -> Option<PathBuf> {
        if !self.config.isolate_jobs {
            return Some(self.config.project_root.clone());
        }

        self.jobs
            .latest()
            .await
            .map(|job| self.config.workspace_for(job.id))
    }

    /// Workspace of a known job
    pub async fn job_workspace(&self, id: Uuid) -> Result<PathBuf, JobError> {
        let job = self.get_job(id).await?;
        Ok(self.config.workspace_for(job.id))
    }

    /// Configuration document stored in a workspace
    pub async fn config_document(&self, workspace: &Path) -> Result<Option<String>, JobError> {
        let path = self.config.config_file_in(workspace);
        Ok(workspace_repository::read_config(&path).await?)
    }

    /// Result text of a workspace, or the "not found" sentinel
    pub async fn result_text(&self, workspace: &Path) -> Result<String, JobError> {
        let path = self.config.result_file_in(workspace);
        let text = workspace_repository::read_result_text(&path).await?;
        Ok(text.unwrap_or_else(|| self.missing_result_message()))
    }

    /// Latest artifact of a workspace
    pub async fn latest_artifact(&self, workspace: &Path) -> Result<Option<PathBuf>, JobError> {
        let dir = self.config.results_dir_in(workspace);
        let artifact =
            workspace_repository::find_latest_artifact(&dir, &self.config.artifact_extension)
                .await?;
        Ok(artifact)
    }

    // =============================================================================
    // User-facing messages
    // =============================================================================

    pub fn missing_result_message(&self) -> String {
        format!("Did not find {} file", self.config.result_file)
    }

    pub fn missing_config_message(&self) -> String {
        format!("{} did not generate", self.config.config_path.display())
    }

    pub fn missing_artifact_message(&self) -> String {
        "Did not find the result file".to_string()
    }
}

async fn run_with_timeout(
    runner: &dyn SimulationRunner,
    invocation: &Invocation,
    timeout: Option<Duration>,
) -> Finished {
    let run = runner.run(invocation);
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, run).await {
            Ok(outcome) => Finished::Run(outcome),
            Err(_) => Finished::TimedOut(limit),
        },
        None => Finished::Run(run.await),
    }
}

fn cancelled_message() -> String {
    "Simulation cancelled".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ProcessRunner;
    use crate::runner::fake::FakeRunner;
    use serde_json::json;
    use tempfile::TempDir;

    fn params(value: serde_json::Value) -> Parameters {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn service(root: &Path, runner: impl SimulationRunner + 'static) -> JobService {
        let config = Config::new(root);
        JobService::new(Arc::new(config), Arc::new(runner))
    }

    async fn wait_until_terminal(service: &JobService, id: Uuid) -> Job {
        for _ in 0..500 {
            let job = service.get_job(id).await.unwrap();
            if job.status.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish", id);
    }

    #[tokio::test]
    async fn test_run_writes_config_and_returns_result_text() {
        let root = TempDir::new().unwrap();
        let service = service(root.path(), FakeRunner::succeeding("OK"));

        let job = service
            .run(params(json!({"discount_rate": 5, "horizon": 24})))
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Succeeded);
        let outcome = job.outcome.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.output, "OK");

        let workspace = service.config().workspace_for(job.id);
        let document = service.config_document(&workspace).await.unwrap().unwrap();
        assert_eq!(document, "discount_rate: 5.0\nhorizon: 24\n");
    }

    #[tokio::test]
    async fn test_missing_result_text_yields_sentinel() {
        let root = TempDir::new().unwrap();
        let mut runner = FakeRunner::succeeding("");
        runner.result_text = None;
        let service = service(root.path(), runner);

        let job = service.run(Parameters::new()).await.unwrap();
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.outcome.unwrap().output, "Did not find results.txt file");
    }

    #[tokio::test]
    async fn test_failed_simulation_relays_output() {
        let root = TempDir::new().unwrap();
        let service = service(
            root.path(),
            FakeRunner::with_outcome(RunOutcome::Failed {
                exit_code: Some(1),
                output: "ERROR: infeasible".to_string(),
            }),
        );

        let job = service.run(Parameters::new()).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        let outcome = job.outcome.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(1));
        assert_eq!(outcome.output, "Julia model error:\nERROR: infeasible");
    }

    #[tokio::test]
    async fn test_missing_script_reports_unavailable_and_keeps_config() {
        let root = TempDir::new().unwrap();
        let script = root.path().join("project/main_day_ahead.jl");
        let service = service(root.path(), ProcessRunner::new("sh", &script));

        let job = service
            .run(params(json!({"horizon": 24})))
            .await
            .unwrap();

        assert_eq!(job.status, JobStatus::Unavailable);
        assert!(
            job.outcome
                .unwrap()
                .output
                .contains(&script.display().to_string())
        );

        let workspace = service.config().workspace_for(job.id);
        let document = service.config_document(&workspace).await.unwrap();
        assert_eq!(document.as_deref(), Some("horizon: 24\n"));
    }

    #[tokio::test]
    async fn test_config_write_failure_fails_the_job() {
        let root = TempDir::new().unwrap();
        // Block the jobs directory with a plain file
        std::fs::write(root.path().join("jobs"), "").unwrap();
        let service = service(root.path(), FakeRunner::succeeding("OK"));

        let job = service.run(Parameters::new()).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(
            job.outcome
                .unwrap()
                .output
                .starts_with("Failed to write configuration:")
        );
    }

    #[tokio::test]
    async fn test_jobs_are_isolated() {
        let root = TempDir::new().unwrap();
        let service = service(root.path(), FakeRunner::succeeding("OK"));

        let first = service.run(params(json!({"horizon": 1}))).await.unwrap();
        let second = service.run(params(json!({"horizon": 2}))).await.unwrap();

        let first_doc = service
            .config_document(&service.config().workspace_for(first.id))
            .await
            .unwrap();
        let second_doc = service
            .config_document(&service.config().workspace_for(second.id))
            .await
            .unwrap();
        assert_eq!(first_doc.as_deref(), Some("horizon: 1\n"));
        assert_eq!(second_doc.as_deref(), Some("horizon: 2\n"));

        assert_eq!(
            service.latest_workspace().await,
            Some(service.config().workspace_for(second.id))
        );
    }

    #[tokio::test]
    async fn test_shared_mode_uses_project_root() {
        let root = TempDir::new().unwrap();
        let mut config = Config::new(root.path());
        config.isolate_jobs = false;
        let service = JobService::new(Arc::new(config), Arc::new(FakeRunner::succeeding("OK")));

        assert_eq!(
            service.latest_workspace().await,
            Some(root.path().to_path_buf())
        );

        service.run(params(json!({"horizon": 3}))).await.unwrap();
        let content = std::fs::read_to_string(root.path().join("project/config.yaml")).unwrap();
        assert_eq!(content, "horizon: 3\n");
    }

    #[tokio::test]
    async fn test_submit_runs_in_background() {
        let root = TempDir::new().unwrap();
        let service = service(
            root.path(),
            FakeRunner::succeeding("done").with_delay(Duration::from_millis(50)),
        );

        let job = service.submit(Parameters::new(), None).await.unwrap();
        assert_eq!(job.status, JobStatus::Queued);

        let finished = wait_until_terminal(&service, job.id).await;
        assert_eq!(finished.status, JobStatus::Succeeded);
        assert!(finished.started_at.is_some());
        assert!(finished.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_timeout_ends_job() {
        let root = TempDir::new().unwrap();
        let service = service(
            root.path(),
            FakeRunner::succeeding("late").with_delay(Duration::from_secs(5)),
        );

        let job = service.submit(Parameters::new(), Some(1)).await.unwrap();
        assert_eq!(job.timeout_seconds, Some(1));

        let finished = wait_until_terminal(&service, job.id).await;
        assert_eq!(finished.status, JobStatus::TimedOut);
        assert_eq!(
            finished.outcome.unwrap().output,
            "Simulation timed out after 1s"
        );
    }

    #[tokio::test]
    async fn test_cancel_running_job() {
        let root = TempDir::new().unwrap();
        let service = service(
            root.path(),
            FakeRunner::succeeding("late").with_delay(Duration::from_secs(5)),
        );

        let job = service.submit(Parameters::new(), None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        service.cancel_job(job.id).await.unwrap();

        let finished = wait_until_terminal(&service, job.id).await;
        assert_eq!(finished.status, JobStatus::Cancelled);

        let again = service.cancel_job(job.id).await;
        assert!(matches!(again, Err(JobError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_cancel_queued_job_never_runs() {
        let root = TempDir::new().unwrap();
        let mut config = Config::new(root.path());
        config.max_parallel_jobs = 1;
        let service = JobService::new(
            Arc::new(config),
            Arc::new(FakeRunner::succeeding("OK").with_delay(Duration::from_millis(300))),
        );

        let first = service.submit(Parameters::new(), None).await.unwrap();
        let second = service.submit(Parameters::new(), None).await.unwrap();
        service.cancel_job(second.id).await.unwrap();

        let cancelled = wait_until_terminal(&service, second.id).await;
        assert_eq!(cancelled.status, JobStatus::Cancelled);
        assert!(cancelled.started_at.is_none());

        let completed = wait_until_terminal(&service, first.id).await;
        assert_eq!(completed.status, JobStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_oldest_finished_jobs_are_evicted() {
        let root = TempDir::new().unwrap();
        let mut config = Config::new(root.path());
        config.max_retained_jobs = 2;
        let service = JobService::new(Arc::new(config), Arc::new(FakeRunner::succeeding("OK")));

        let first = service.run(params(json!({"horizon": 1}))).await.unwrap();
        let first_workspace = service.config().workspace_for(first.id);
        assert!(first_workspace.exists());

        let second = service.run(params(json!({"horizon": 2}))).await.unwrap();
        let third = service.run(params(json!({"horizon": 3}))).await.unwrap();

        assert!(matches!(service.get_job(first.id).await, Err(JobError::NotFound(_))));
        assert!(!first_workspace.exists());
        assert!(service.get_job(second.id).await.is_ok());
        assert!(service.get_job(third.id).await.is_ok());
        assert_eq!(service.list_jobs().await.len(), 2);
        assert!(service.config().workspace_for(third.id).exists());
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let root = TempDir::new().unwrap();
        let service = service(root.path(), FakeRunner::succeeding("OK"));
        let id = Uuid::new_v4();

        assert!(matches!(service.get_job(id).await, Err(JobError::NotFound(_))));
        assert!(matches!(service.cancel_job(id).await, Err(JobError::NotFound(_))));
        assert!(service.latest_workspace().await.is_none());
    }
}
