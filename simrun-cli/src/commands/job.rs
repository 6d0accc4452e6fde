//! Job command handlers
//!
//! Handles all job-related CLI commands including submission,
//! listing, viewing details, cancellation and per-job outputs.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use simrun_client::SimrunClient;
use simrun_core::domain::job::{Job, JobStatus};
use std::path::PathBuf;
use std::time::Duration;

use crate::commands::params::ParamArgs;
use crate::commands::run::save_download;
use crate::config::Config;
use crate::id_resolver::resolve_job_id;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Queue a new simulation job
    Submit {
        #[command(flatten)]
        params: ParamArgs,

        /// Timeout in seconds (0 disables the server default)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Wait for the job to finish
        #[arg(short, long)]
        wait: bool,
    },
    /// List all jobs
    List,
    /// Get job details
    Get {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Cancel a queued or running job
    Cancel {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Wait for a job to finish
    Wait {
        /// Job ID or unambiguous prefix
        id: String,

        /// Polling interval in milliseconds
        #[arg(long, default_value = "500")]
        interval: u64,
    },
    /// Print the configuration document written for a job
    Config {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Print the result text of a job
    Result {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Save the latest artifact of a job
    Download {
        /// Job ID or unambiguous prefix
        id: String,

        /// Directory to save the file into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

/// Handle job commands
///
/// Routes job subcommands to their respective handlers.
///
/// # Arguments
/// * `command` - The job command to execute
/// * `config` - The CLI configuration
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        JobCommands::Submit {
            params,
            timeout,
            wait,
        } => submit_job(&client, params, timeout, wait).await,
        JobCommands::List => list_jobs(&client).await,
        JobCommands::Get { id } => get_job(&client, &id).await,
        JobCommands::Cancel { id } => cancel_job(&client, &id).await,
        JobCommands::Wait { id, interval } => wait_for_job(&client, &id, interval).await,
        JobCommands::Config { id } => job_config(&client, &id).await,
        JobCommands::Result { id } => job_result(&client, &id).await,
        JobCommands::Download { id, output } => download_artifact(&client, &id, output).await,
    }
}

/// Queue a job, optionally waiting for it
async fn submit_job(
    client: &SimrunClient,
    params: ParamArgs,
    timeout: Option<u64>,
    wait: bool,
) -> Result<()> {
    let parameters = params.into_parameters()?;
    let job = client.submit_job(&parameters, timeout).await?;

    println!("{}", "✓ Job queued".green().bold());
    println!("  ID: {}", job.id.to_string().cyan());

    if wait {
        println!();
        let job = client
            .wait_for_job(job.id, Duration::from_millis(500))
            .await?;
        print_job_details(&job);
    }

    Ok(())
}

/// List all jobs
async fn list_jobs(client: &SimrunClient) -> Result<()> {
    let jobs = client.list_jobs().await?;

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

/// Get and display a single job
async fn get_job(client: &SimrunClient, id: &str) -> Result<()> {
    let uuid = resolve_job_id(client, &id.into()).await?;

    let job = client.get_job(uuid).await?;
    print_job_details(&job);

    Ok(())
}

async fn cancel_job(client: &SimrunClient, id: &str) -> Result<()> {
    let uuid = resolve_job_id(client, &id.into()).await?;

    let job = client.cancel_job(uuid).await?;
    println!(
        "{} {} (was {})",
        "✓ Cancellation requested for".green().bold(),
        job.id.to_string().cyan(),
        colorize_status(job.status)
    );

    Ok(())
}

async fn wait_for_job(client: &SimrunClient, id: &str, interval: u64) -> Result<()> {
    let uuid = resolve_job_id(client, &id.into()).await?;

    println!("{}", format!("Waiting for job {}...", uuid).dimmed());
    let job = client
        .wait_for_job(uuid, Duration::from_millis(interval.max(1)))
        .await?;
    print_job_details(&job);

    Ok(())
}

async fn job_config(client: &SimrunClient, id: &str) -> Result<()> {
    let uuid = resolve_job_id(client, &id.into()).await?;

    print!("{}", client.job_config(uuid).await?);

    Ok(())
}

async fn job_result(client: &SimrunClient, id: &str) -> Result<()> {
    let uuid = resolve_job_id(client, &id.into()).await?;

    println!("{}", client.job_result(uuid).await?);

    Ok(())
}

async fn download_artifact(client: &SimrunClient, id: &str, output: PathBuf) -> Result<()> {
    let uuid = resolve_job_id(client, &id.into()).await?;

    let download = client.download_job_artifact(uuid).await?;
    let path = save_download(&download, &output)?;
    println!(
        "{} {}",
        "✓ Saved".green().bold(),
        path.display().to_string().cyan()
    );

    Ok(())
}

/// Print a job summary from a full Job object
fn print_job_summary(job: &Job) {
    println!("  {} Job {}", "▸".cyan(), job.id.to_string().dimmed());
    println!("    Status:   {}", colorize_status(job.status));
    println!(
        "    Created:  {}",
        job.requested_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.id.to_string().cyan());
    println!("  Status:      {}", colorize_status(job.status));
    println!(
        "  Requested:   {}",
        job.requested_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(started) = job.started_at {
        println!("  Started:     {}", started.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(completed) = job.completed_at {
        println!("  Completed:   {}", completed.format("%Y-%m-%d %H:%M:%S"));

        if let Some(started) = job.started_at {
            let duration = completed.signed_duration_since(started);
            println!("  Duration:    {}s", duration.num_seconds());
        }
    }

    if let Some(timeout) = job.timeout_seconds {
        println!("  Timeout:     {}s", timeout);
    }

    if !job.parameters.is_empty() {
        println!("\n{}", "Parameters:".bold());
        for (key, value) in &job.parameters {
            println!("  {} = {}", key.cyan(), value);
        }
    }

    if let Some(outcome) = &job.outcome {
        println!("\n{}", "Outcome:".bold());
        println!(
            "  Success:    {}",
            if outcome.success {
                "✓".green()
            } else {
                "✗".red()
            }
        );
        if let Some(code) = outcome.exit_code {
            println!("  Exit Code:  {}", code);
        }

        println!("\n{}", "Output:".bold());
        if outcome.success {
            println!("{}", outcome.output);
        } else {
            println!("{}", outcome.output.red());
        }
    }
}

/// Colorize job status for display
fn colorize_status(status: JobStatus) -> colored::ColoredString {
    let status_str = format!("{:?}", status);
    match status {
        JobStatus::Queued => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Succeeded => status_str.green(),
        JobStatus::Failed | JobStatus::TimedOut => status_str.red(),
        JobStatus::Unavailable => status_str.magenta(),
        JobStatus::Cancelled => status_str.dimmed(),
    }
}
