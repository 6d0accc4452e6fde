//! Server configuration
//!
//! Defines where the simulation lives, where its inputs and outputs go,
//! and how many jobs may run at once.

use std::path::{Path, PathBuf};
use std::time::Duration;

use uuid::Uuid;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Root directory that relative paths resolve against
    pub project_root: PathBuf,

    /// Interpreter or binary that runs the simulation (e.g., "julia")
    pub interpreter: String,

    /// Simulation script, relative to the project root
    pub script: PathBuf,

    /// Configuration document, relative to a job workspace
    pub config_path: PathBuf,

    /// Output directory, relative to a job workspace
    pub results_dir: PathBuf,

    /// Name of the result text file inside the output directory
    pub result_file: String,

    /// Extension of downloadable artifacts, without the dot
    pub artifact_extension: String,

    /// Directory holding per-job workspaces, relative to the project root
    pub jobs_dir: PathBuf,

    /// Give every job its own workspace instead of sharing the project root
    pub isolate_jobs: bool,

    /// Default time limit for a job; `None` lets it run to completion
    pub job_timeout: Option<Duration>,

    /// Max simulations running at the same time
    pub max_parallel_jobs: usize,

    /// Finished jobs kept (record and workspace) before the oldest are evicted; 0 keeps all
    pub max_retained_jobs: usize,
}

impl Config {
    /// Creates a configuration rooted at `project_root` with defaults
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            project_root: project_root.into(),
            interpreter: "julia".to_string(),
            script: PathBuf::from("project/main_day_ahead.jl"),
            config_path: PathBuf::from("project/config.yaml"),
            results_dir: PathBuf::from("project/Results"),
            result_file: "results.txt".to_string(),
            artifact_extension: "csv".to_string(),
            jobs_dir: PathBuf::from("jobs"),
            isolate_jobs: true,
            job_timeout: None,
            max_parallel_jobs: 2,
            max_retained_jobs: 100,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - SIMRUN_BIND_ADDR (default: 0.0.0.0:8080)
    /// - SIMRUN_PROJECT_ROOT (default: current directory)
    /// - SIMRUN_INTERPRETER (default: julia)
    /// - SIMRUN_SCRIPT (default: project/main_day_ahead.jl)
    /// - SIMRUN_CONFIG_PATH (default: project/config.yaml)
    /// - SIMRUN_RESULTS_DIR (default: project/Results)
    /// - SIMRUN_RESULT_FILE (default: results.txt)
    /// - SIMRUN_ARTIFACT_EXTENSION (default: csv)
    /// - SIMRUN_JOBS_DIR (default: jobs)
    /// - SIMRUN_ISOLATE_JOBS (default: true)
    /// - SIMRUN_JOB_TIMEOUT (seconds, default: none; 0 also means none)
    /// - SIMRUN_MAX_PARALLEL_JOBS (default: 2)
    /// - SIMRUN_MAX_RETAINED_JOBS (default: 100; 0 keeps every job)
    pub fn from_env() -> Self {
        let project_root = env_string("SIMRUN_PROJECT_ROOT").unwrap_or_else(|| ".".to_string());
        let defaults = Self::new(project_root);

        let job_timeout = std::env::var("SIMRUN_JOB_TIMEOUT")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let isolate_jobs = std::env::var("SIMRUN_ISOLATE_JOBS")
            .ok()
            .and_then(|s| parse_bool(&s))
            .unwrap_or(defaults.isolate_jobs);

        let max_parallel_jobs = std::env::var("SIMRUN_MAX_PARALLEL_JOBS")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(defaults.max_parallel_jobs);

        let max_retained_jobs = std::env::var("SIMRUN_MAX_RETAINED_JOBS")
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(defaults.max_retained_jobs);

        Self {
            bind_addr: env_string("SIMRUN_BIND_ADDR").unwrap_or(defaults.bind_addr),
            interpreter: env_string("SIMRUN_INTERPRETER").unwrap_or(defaults.interpreter),
            script: env_string("SIMRUN_SCRIPT")
                .map(PathBuf::from)
                .unwrap_or(defaults.script),
            config_path: env_string("SIMRUN_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.config_path),
            results_dir: env_string("SIMRUN_RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.results_dir),
            result_file: env_string("SIMRUN_RESULT_FILE").unwrap_or(defaults.result_file),
            artifact_extension: env_string("SIMRUN_ARTIFACT_EXTENSION")
                .map(|ext| ext.trim_start_matches('.').to_string())
                .unwrap_or(defaults.artifact_extension),
            jobs_dir: env_string("SIMRUN_JOBS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.jobs_dir),
            isolate_jobs,
            job_timeout,
            max_parallel_jobs,
            max_retained_jobs,
            project_root: defaults.project_root,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.interpreter.trim().is_empty() {
            anyhow::bail!("interpreter cannot be empty");
        }

        if self.script.as_os_str().is_empty() {
            anyhow::bail!("script cannot be empty");
        }

        for (name, path) in [
            ("config_path", &self.config_path),
            ("results_dir", &self.results_dir),
        ] {
            if path.as_os_str().is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
            if path.is_absolute() {
                anyhow::bail!("{} must be relative to the job workspace", name);
            }
        }

        if self.result_file.is_empty() {
            anyhow::bail!("result_file cannot be empty");
        }

        if self.artifact_extension.is_empty() {
            anyhow::bail!("artifact_extension cannot be empty");
        }

        if self.max_parallel_jobs == 0 {
            anyhow::bail!("max_parallel_jobs must be greater than 0");
        }

        Ok(())
    }

    /// Number of simulations allowed to run concurrently
    ///
    /// The shared workspace only has one configuration slot, so it runs one job at a time.
    pub fn effective_parallelism(&self) -> usize {
        if self.isolate_jobs {
            self.max_parallel_jobs
        } else {
            1
        }
    }

    /// Display name of the simulation model, taken from the interpreter
    /// (`julia` → `Julia`, `/usr/bin/python3` → `Python3`)
    pub fn model_name(&self) -> String {
        let stem = Path::new(self.interpreter.trim())
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut chars = stem.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => "Simulation".to_string(),
        }
    }

    /// Absolute-or-root-relative path of the simulation script
    pub fn script_path(&self) -> PathBuf {
        self.project_root.join(&self.script)
    }

    /// Workspace directory the job's simulation runs in
    pub fn workspace_for(&self, job_id: Uuid) -> PathBuf {
        if self.isolate_jobs {
            self.project_root
                .join(&self.jobs_dir)
                .join(job_id.to_string())
        } else {
            self.project_root.clone()
        }
    }

    /// Configuration document inside a workspace
    pub fn config_file_in(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.config_path)
    }

    /// Output directory inside a workspace
    pub fn results_dir_in(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.results_dir)
    }

    /// Result text file inside a workspace
    pub fn result_file_in(&self, workspace: &Path) -> PathBuf {
        self.results_dir_in(workspace).join(&self.result_file)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(".")
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.interpreter, "julia");
        assert_eq!(config.script, PathBuf::from("project/main_day_ahead.jl"));
        assert_eq!(config.config_path, PathBuf::from("project/config.yaml"));
        assert_eq!(config.result_file, "results.txt");
        assert_eq!(config.artifact_extension, "csv");
        assert!(config.isolate_jobs);
        assert!(config.job_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_model_name_follows_interpreter() {
        let mut config = Config::default();
        assert_eq!(config.model_name(), "Julia");

        config.interpreter = "/usr/bin/python3".to_string();
        assert_eq!(config.model_name(), "Python3");

        config.interpreter = "  ".to_string();
        assert_eq!(config.model_name(), "Simulation");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.interpreter = "  ".to_string();
        assert!(config.validate().is_err());
        config.interpreter = "julia".to_string();

        config.config_path = PathBuf::from("/etc/config.yaml");
        assert!(config.validate().is_err());
        config.config_path = PathBuf::from("project/config.yaml");

        config.max_parallel_jobs = 0;
        assert!(config.validate().is_err());
        config.max_parallel_jobs = 1;

        config.artifact_extension = String::new();
        assert!(config.validate().is_err());
        config.artifact_extension = "csv".to_string();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_workspace_resolution() {
        let mut config = Config::new("/srv/sim");
        let id = Uuid::new_v4();

        let workspace = config.workspace_for(id);
        assert_eq!(workspace, PathBuf::from(format!("/srv/sim/jobs/{}", id)));
        assert_eq!(
            config.result_file_in(&workspace),
            workspace.join("project/Results/results.txt")
        );

        config.isolate_jobs = false;
        assert_eq!(config.workspace_for(id), PathBuf::from("/srv/sim"));
        assert_eq!(
            config.config_file_in(&config.workspace_for(id)),
            PathBuf::from("/srv/sim/project/config.yaml")
        );
    }

    #[test]
    fn test_shared_workspace_runs_one_job_at_a_time() {
        let mut config = Config::default();
        config.max_parallel_jobs = 4;
        assert_eq!(config.effective_parallelism(), 4);

        config.isolate_jobs = false;
        assert_eq!(config.effective_parallelism(), 1);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
