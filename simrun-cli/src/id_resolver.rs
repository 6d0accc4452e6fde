//! ID resolver module
//!
//! Handles resolution of UUID prefixes to full UUIDs by querying the API.
//! This allows users to specify short, unambiguous prefixes instead of full UUIDs.

use anyhow::{Context, Result, anyhow};
use simrun_client::SimrunClient;
use uuid::Uuid;

use crate::types::IdOrPrefix;

/// Resolve a job ID or prefix to a full UUID
///
/// If the input is already a full UUID, returns it immediately.
/// Otherwise, fetches all jobs and finds the one matching the prefix.
///
/// # Errors
/// Returns an error if:
/// - No job matches the prefix
/// - Multiple jobs match the prefix (ambiguous)
/// - API call fails
pub async fn resolve_job_id(client: &SimrunClient, id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    if let Some(uuid) = id_or_prefix.as_uuid() {
        return Ok(uuid);
    }

    let jobs = client
        .list_jobs()
        .await
        .context("Failed to fetch jobs for ID resolution")?;

    select_unique(jobs.iter().map(|j| j.id), id_or_prefix)
}

/// Pick the single id matching a prefix
fn select_unique(ids: impl IntoIterator<Item = Uuid>, id_or_prefix: &IdOrPrefix) -> Result<Uuid> {
    let matches: Vec<Uuid> = ids
        .into_iter()
        .filter(|id| id_or_prefix.matches(id))
        .collect();

    match matches.as_slice() {
        [] => Err(anyhow!(
            "No job found with ID starting with '{}'",
            id_or_prefix
        )),
        [id] => Ok(*id),
        _ => {
            let ids: Vec<String> = matches.iter().map(Uuid::to_string).collect();
            Err(anyhow!(
                "Ambiguous prefix '{}' matches multiple jobs: {}",
                id_or_prefix,
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<Uuid> {
        [
            "aa11aaaa-0000-4000-8000-000000000000",
            "aa22aaaa-0000-4000-8000-000000000000",
            "bb11bbbb-0000-4000-8000-000000000000",
        ]
        .iter()
        .map(|s| Uuid::parse_str(s).unwrap())
        .collect()
    }

    #[test]
    fn test_unique_prefix_resolves() {
        let id = select_unique(ids(), &IdOrPrefix::parse("bb")).unwrap();
        assert_eq!(id, ids()[2]);
    }

    #[test]
    fn test_ambiguous_prefix_lists_candidates() {
        let err = select_unique(ids(), &IdOrPrefix::parse("aa")).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Ambiguous prefix 'aa'"));
        assert!(message.contains("aa11aaaa"));
        assert!(message.contains("aa22aaaa"));
    }

    #[test]
    fn test_unknown_prefix_fails() {
        let err = select_unique(ids(), &IdOrPrefix::parse("cc")).unwrap_err();
        assert_eq!(err.to_string(), "No job found with ID starting with 'cc'");
    }
}
