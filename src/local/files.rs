//! Bundled file lookup for repos installed on disk.

use anyhow::{Context, Result};

use crate::types::RepoDescriptor;

/// True if `file` exists in any of the repo's local directories.
pub fn local_file_exists(repo: &RepoDescriptor, file: &str) -> bool {
    repo.local_candidates(file).iter().any(|p| p.is_file())
}

/// Read `file` from the first local directory that has it.
///
/// Returns `Ok(None)` when no candidate exists; a file that exists but
/// cannot be read is an error.
pub async fn read_local_file(repo: &RepoDescriptor, file: &str) -> Result<Option<String>> {
    for path in repo.local_candidates(file) {
        if !path.is_file() {
            continue;
        }
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(Some(content));
    }
    Ok(None)
}
