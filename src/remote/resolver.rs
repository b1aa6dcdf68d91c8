//! Project identity resolution.

use serde_json::Value;
use tracing::debug;

use crate::local::CacheKey;

use super::api::RemoteApi;
use super::provider::{GitHost, Operation, ProjectIdentity, Shape, find_project, is_usable};

impl RemoteApi {
    /// Identity used to address the repo in API paths.
    ///
    /// Resolved once per instance. `None` means the project list was readable
    /// but does not contain this repo.
    pub async fn get_project_identity(&mut self) -> Option<ProjectIdentity> {
        if let Some(resolved) = &self.project {
            return resolved.clone();
        }
        let resolved = self.resolve_project().await;
        self.project = Some(resolved.clone());
        resolved
    }

    async fn resolve_project(&self) -> Option<ProjectIdentity> {
        if !self.host.addresses_by_id() {
            return Some(ProjectIdentity::Path(self.repo.full_name()));
        }

        let projects = match self.cache.get(CacheKey::Projects).await {
            Some(projects) => projects,
            None => {
                let listing = self
                    .api(Operation::Projects, None)
                    .await
                    .filter(|l| is_usable(l, Shape::Array));
                let Some(listing) = listing else {
                    debug!(repo = %self.repo.full_name(), "no project list, addressing by path");
                    return Some(ProjectIdentity::encoded(&self.repo));
                };
                self.cache.put(CacheKey::Projects, &listing).await;
                listing
            }
        };

        let Some(project) = find_project(&projects, &self.repo.repo) else {
            debug!(repo = %self.repo.full_name(), "repo not in project list");
            return None;
        };
        self.cache.put(CacheKey::Meta, project).await;

        project.get("id").and_then(Value::as_u64).map(ProjectIdentity::Id)
    }
}
