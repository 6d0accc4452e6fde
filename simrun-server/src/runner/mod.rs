//! Simulation runner
//!
//! Runs the external simulation for one job and reports how it ended.
//! The runner never interprets the simulation's outputs: success or failure
//! comes from the exit code alone, result files are read afterwards by the
//! workspace repository.

mod process;

pub use process::ProcessRunner;

use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

/// Everything the simulation needs to know about the job it runs for
#[derive(Debug, Clone)]
pub struct Invocation {
    pub job_id: Uuid,
    /// Working directory of the simulation process
    pub workspace: PathBuf,
    /// Configuration document written for this job
    pub config_file: PathBuf,
    /// Directory the simulation writes its outputs to
    pub results_dir: PathBuf,
}

/// How a simulation run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Exit code zero
    Succeeded,
    /// The process ran and exited non-zero (or was killed by a signal)
    Failed {
        exit_code: Option<i32>,
        output: String,
    },
    /// The interpreter or script could not be launched at all
    Unavailable { message: String },
}

/// Trait for anything able to run a simulation to completion
///
/// Implementations must stop the simulation when the returned future is
/// dropped; timeouts and cancellation rely on it.
#[async_trait]
pub trait SimulationRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> RunOutcome;
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-process runner that behaves like a well-mannered simulation.

    use super::*;
    use std::time::Duration;

    pub struct FakeRunner {
        pub outcome: RunOutcome,
        pub result_text: Option<String>,
        pub artifacts: Vec<String>,
        pub delay: Option<Duration>,
    }

    impl FakeRunner {
        pub fn succeeding(result_text: &str) -> Self {
            Self {
                outcome: RunOutcome::Succeeded,
                result_text: Some(result_text.to_string()),
                artifacts: Vec::new(),
                delay: None,
            }
        }

        pub fn with_outcome(outcome: RunOutcome) -> Self {
            Self {
                outcome,
                result_text: None,
                artifacts: Vec::new(),
                delay: None,
            }
        }

        pub fn with_artifacts(mut self, names: &[&str]) -> Self {
            self.artifacts = names.iter().map(|n| n.to_string()).collect();
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl SimulationRunner for FakeRunner {
        async fn run(&self, invocation: &Invocation) -> RunOutcome {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if self.outcome == RunOutcome::Succeeded {
                tokio::fs::create_dir_all(&invocation.results_dir)
                    .await
                    .unwrap();
                if let Some(text) = &self.result_text {
                    tokio::fs::write(invocation.results_dir.join("results.txt"), text)
                        .await
                        .unwrap();
                }
                for name in &self.artifacts {
                    tokio::fs::write(invocation.results_dir.join(name), name)
                        .await
                        .unwrap();
                }
            }

            self.outcome.clone()
        }
    }
}
