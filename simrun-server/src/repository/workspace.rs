//! Workspace Repository
//!
//! Filesystem access for job workspaces: writing the configuration document
//! the simulation reads, and collecting what the simulation left behind.
//!
//! A missing file or directory is a normal state (nothing has run yet) and
//! comes back as `None`; only genuine I/O failures are errors.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Filesystem errors raised while accessing a workspace
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Write a configuration document, replacing any previous one
///
/// The document is written to a sibling temporary file and renamed into
/// place, so a reader never sees a partially written document.
pub async fn write_config(path: &Path, document: &str) -> Result<(), WorkspaceError> {
    let write_err = |source| WorkspaceError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string());
    let staging = path.with_file_name(format!(".{}.tmp", file_name));

    tokio::fs::write(&staging, document)
        .await
        .map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(write_err(e));
    }

    debug!("Wrote configuration document {}", path.display());
    Ok(())
}

/// Delete a job workspace and everything in it; a missing workspace is fine
pub async fn remove_workspace(workspace: &Path) -> Result<(), WorkspaceError> {
    match tokio::fs::remove_dir_all(workspace).await {
        Ok(()) => {
            debug!("Removed workspace {}", workspace.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(WorkspaceError::Remove {
            path: workspace.to_path_buf(),
            source,
        }),
    }
}

/// Read a configuration document verbatim
pub async fn read_config(path: &Path) -> Result<Option<String>, WorkspaceError> {
    read_text(path).await
}

/// Read the simulation's result text verbatim
pub async fn read_result_text(path: &Path) -> Result<Option<String>, WorkspaceError> {
    read_text(path).await
}

/// Find the latest artifact in an output directory
///
/// Only regular files named `*.<extension>` count; "latest" is the
/// lexicographically greatest file name, not the newest file.
pub async fn find_latest_artifact(
    dir: &Path,
    extension: &str,
) -> Result<Option<PathBuf>, WorkspaceError> {
    let read_err = |source| WorkspaceError::Read {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(read_err(e)),
    };

    let suffix = format!(".{}", extension);
    let mut latest: Option<String> = None;

    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.ends_with(&suffix) {
            continue;
        }

        // Follows symlinks, unlike DirEntry::file_type
        let is_file = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }

        if latest.as_ref().is_none_or(|current| name > *current) {
            latest = Some(name);
        }
    }

    Ok(latest.map(|name| dir.join(name)))
}

async fn read_text(path: &Path) -> Result<Option<String>, WorkspaceError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(WorkspaceError::Read {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
