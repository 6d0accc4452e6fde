//! Form command handlers
//!
//! Run a simulation and wait for it, print the last configuration
//! document, save the latest artifact.

use anyhow::{Context, Result, bail};
use colored::*;
use simrun_client::{ClientError, Download};
use std::path::{Path, PathBuf};

use crate::commands::params::ParamArgs;
use crate::config::Config;

/// Run a simulation and print its result text
pub async fn run_simulation(config: &Config, params: ParamArgs) -> Result<()> {
    let client = config.client();
    let parameters = params.into_parameters()?;

    println!("{}", "Running simulation...".cyan());

    match client.run(&parameters).await {
        Ok(output) => {
            println!("{}", "✓ Simulation finished".green().bold());
            println!();
            println!("{}", output);
            Ok(())
        }
        Err(ClientError::SimulationFailed(output)) => {
            println!("{}", "✗ Simulation failed".red().bold());
            println!();
            println!("{}", output);
            bail!("simulation did not succeed")
        }
        Err(e) => Err(e).context("Failed to run simulation"),
    }
}

/// Print the configuration document of the last run
pub async fn view_config(config: &Config) -> Result<()> {
    let client = config.client();

    let document = client
        .view_config()
        .await
        .context("Failed to fetch configuration")?;
    print!("{}", document);

    Ok(())
}

/// Save the latest artifact of the last run
pub async fn download_latest(config: &Config, output: &Path) -> Result<()> {
    let client = config.client();

    match client.download_latest().await? {
        Some(download) => {
            let path = save_download(&download, output)?;
            println!(
                "{} {}",
                "✓ Saved".green().bold(),
                path.display().to_string().cyan()
            );
        }
        None => println!("{}", "No artifact available.".yellow()),
    }

    Ok(())
}

/// Write a downloaded artifact into `dir`, returning the file path
pub fn save_download(download: &Download, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let path = dir.join(&download.file_name);
    std::fs::write(&path, &download.bytes)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    Ok(path)
}
