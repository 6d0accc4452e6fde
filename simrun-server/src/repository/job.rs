//! Job Repository
//!
//! Keeps job records in memory for the lifetime of the server process.
//! Records are never persisted: a restart forgets every job. Finished jobs
//! beyond the retention limit are evicted oldest first.

use simrun_core::domain::job::{Job, JobOutcome, JobStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};
use uuid::Uuid;

/// In-memory job registry
#[derive(Default)]
pub struct JobRepository {
    inner: RwLock<Registry>,
}

#[derive(Default)]
struct Registry {
    jobs: HashMap<Uuid, JobEntry>,
    /// Most recently submitted job
    latest: Option<Uuid>,
}

struct JobEntry {
    job: Job,
    cancel: Arc<Notify>,
}

impl JobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job and make it the latest one
    ///
    /// Returns the signal used to cancel it.
    pub async fn insert(&self, job: Job) -> Arc<Notify> {
        let cancel = Arc::new(Notify::new());
        let mut registry = self.inner.write().await;

        registry.latest = Some(job.id);
        registry.jobs.insert(
            job.id,
            JobEntry {
                job,
                cancel: cancel.clone(),
            },
        );

        cancel
    }

    /// Find a job by ID
    pub async fn find_by_id(&self, id: Uuid) -> Option<Job> {
        let registry = self.inner.read().await;
        registry.jobs.get(&id).map(|entry| entry.job.clone())
    }

    /// The most recently submitted job
    pub async fn latest(&self) -> Option<Job> {
        let registry = self.inner.read().await;
        registry
            .latest
            .and_then(|id| registry.jobs.get(&id))
            .map(|entry| entry.job.clone())
    }

    /// List all jobs, newest first
    pub async fn list_all(&self) -> Vec<Job> {
        let registry = self.inner.read().await;
        let mut jobs: Vec<Job> = registry.jobs.values().map(|e| e.job.clone()).collect();
        jobs.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        jobs
    }

    /// Cancellation signal of a job
    pub async fn cancel_signal(&self, id: Uuid) -> Option<Arc<Notify>> {
        let registry = self.inner.read().await;
        registry.jobs.get(&id).map(|entry| entry.cancel.clone())
    }

    /// Move a queued job to Running
    ///
    /// Returns `None` if the job is unknown or no longer queued.
    pub async fn update_status_to_running(&self, id: Uuid) -> Option<Job> {
        let mut registry = self.inner.write().await;
        let entry = registry.jobs.get_mut(&id)?;

        if entry.job.status != JobStatus::Queued {
            return None;
        }

        entry.job.status = JobStatus::Running;
        entry.job.started_at = Some(chrono::Utc::now());
        Some(entry.job.clone())
    }

    /// Record the final status and outcome of a job
    ///
    /// Terminal jobs are left untouched; the stored record is returned either way.
    pub async fn complete(&self, id: Uuid, status: JobStatus, outcome: JobOutcome) -> Option<Job> {
        let mut registry = self.inner.write().await;
        let entry = registry.jobs.get_mut(&id)?;

        if !entry.job.status.is_terminal() {
            entry.job.status = status;
            entry.job.completed_at = Some(chrono::Utc::now());
            entry.job.outcome = Some(outcome);
        }

        Some(entry.job.clone())
    }

    /// Evict the oldest finished jobs until at most `keep` records remain
    ///
    /// Queued and running jobs and the latest submission are never evicted,
    /// so the registry can stay above `keep` while they are active.
    /// Returns the evicted job IDs.
    pub async fn evict_finished(&self, keep: usize) -> Vec<Uuid> {
        let mut registry = self.inner.write().await;
        let excess = registry.jobs.len().saturating_sub(keep);
        if excess == 0 {
            return Vec::new();
        }

        let mut finished: Vec<&Job> = registry
            .jobs
            .values()
            .map(|entry| &entry.job)
            .filter(|job| job.status.is_terminal() && Some(job.id) != registry.latest)
            .collect();
        finished.sort_by_key(|job| (job.completed_at, job.requested_at));

        let evicted: Vec<Uuid> = finished.iter().take(excess).map(|job| job.id).collect();
        for id in &evicted {
            registry.jobs.remove(id);
        }

        evicted
    }
}
