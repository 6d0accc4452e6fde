//! Child process runner
//!
//! Launches `<interpreter> <script>` inside the job workspace and waits for it.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{Invocation, RunOutcome, SimulationRunner};

/// Runs the simulation as a child process
pub struct ProcessRunner {
    interpreter: String,
    script: PathBuf,
}

impl ProcessRunner {
    /// Creates a runner for `interpreter script`
    ///
    /// # Arguments
    /// * `interpreter` - Program to launch (e.g., "julia")
    /// * `script` - Script handed to the interpreter; should be absolute since
    ///   the process starts inside the job workspace
    pub fn new(interpreter: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
        }
    }

    fn unavailable(&self) -> RunOutcome {
        RunOutcome::Unavailable {
            message: format!(
                "{}, please make sure the file exists",
                self.script.display()
            ),
        }
    }

    fn command(&self, invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&self.script)
            .current_dir(&invocation.workspace)
            .env("SIMRUN_JOB_ID", invocation.job_id.to_string())
            .env("SIMRUN_WORKSPACE", &invocation.workspace)
            .env("SIMRUN_CONFIG", &invocation.config_file)
            .env("SIMRUN_RESULTS_DIR", &invocation.results_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl SimulationRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> RunOutcome {
        if !self.script.is_file() {
            warn!("Simulation script not found: {}", self.script.display());
            return self.unavailable();
        }

        debug!(
            "Launching {} {} in {}",
            self.interpreter,
            self.script.display(),
            invocation.workspace.display()
        );

        let output = match self.command(invocation).output().await {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to launch {}: {}", self.interpreter, e);
                return self.unavailable();
            }
        };

        if output.status.success() {
            info!("Simulation for job {} exited successfully", invocation.job_id);
            return RunOutcome::Succeeded;
        }

        let exit_code = output.status.code();
        warn!(
            "Simulation for job {} failed (exit code: {:?})",
            invocation.job_id, exit_code
        );

        RunOutcome::Failed {
            exit_code,
            output: combine_output(&output.stdout, &output.stderr),
        }
    }
}

/// Joins captured stdout and stderr, stdout first
fn combine_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(stdout).into_owned();
    let stderr = String::from_utf8_lossy(stderr);

    if !stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&stderr);
    }

    text
}
