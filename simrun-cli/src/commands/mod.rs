//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod params;
mod run;

pub use job::JobCommands;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::config::Config;
use params::ParamArgs;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a simulation and wait for its result
    Run {
        #[command(flatten)]
        params: ParamArgs,
    },
    /// Print the configuration document of the last run
    Config,
    /// Save the latest artifact of the last run
    Download {
        /// Directory to save the file into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    /// Asynchronous job management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
///
/// # Returns
/// Result indicating success or failure
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Run { params } => run::run_simulation(config, params).await,
        Commands::Config => run::view_config(config).await,
        Commands::Download { output } => run::download_latest(config, &output).await,
        Commands::Job { command } => job::handle_job_command(command, config).await,
    }
}
