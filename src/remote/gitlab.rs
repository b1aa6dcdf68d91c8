//! GitLab (gitlab.com and self-hosted CE/EE).

use serde_json::Value;

use crate::types::RepoDescriptor;

use super::provider::{GitHost, Operation, ProjectIdentity, RepoMeta, timestamp_field, url_encode};

const GITLAB_API: &str = "https://gitlab.com/api/v3";
const GITLAB_WEB: &str = "https://gitlab.com";

/// GitLab addresses projects by numeric ID and authenticates with `private_token`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitLabHost;

impl GitHost for GitLabHost {
    fn api_base(&self) -> &'static str {
        GITLAB_API
    }

    fn enterprise_api_prefix(&self, enterprise: &str) -> String {
        format!("{}/api/v3", enterprise)
    }

    fn token_param(&self, _enterprise: bool) -> &'static str {
        "private_token"
    }

    fn requires_tokens(&self) -> bool {
        true
    }

    fn addresses_by_id(&self) -> bool {
        true
    }

    fn endpoint_path(
        &self,
        op: &Operation,
        project: Option<&ProjectIdentity>,
        repo: &RepoDescriptor,
    ) -> String {
        let id = project
            .cloned()
            .unwrap_or_else(|| ProjectIdentity::encoded(repo));

        match op {
            Operation::Projects => "/projects".to_string(),
            Operation::Meta => format!("/projects/{}", id),
            Operation::Tags => format!("/projects/{}/repository/tags", id),
            Operation::Branches => format!("/projects/{}/repository/branches", id),
            Operation::File(_) | Operation::Changes(_) | Operation::Readme => format!(
                "/projects/{}/repository/files?file_path={}",
                id,
                url_encode(op.file_path().unwrap_or_default())
            ),
        }
    }

    fn download_base(&self) -> &'static str {
        GITLAB_WEB
    }

    fn enterprise_download_base(&self, enterprise: &str) -> String {
        enterprise.to_string()
    }

    fn archive_url(
        &self,
        base: &str,
        repo: &RepoDescriptor,
        git_ref: Option<&str>,
    ) -> (String, Vec<(&'static str, String)>) {
        let url = [
            base,
            repo.owner.as_str(),
            repo.repo.as_str(),
            "repository/archive.zip",
        ]
        .join("/");
        let query = git_ref
            .map(|r| vec![("ref", r.to_string())])
            .unwrap_or_default();
        (url, query)
    }

    fn meta_from_projects(&self) -> bool {
        true
    }

    fn map_meta(&self, meta: &Value) -> RepoMeta {
        // v3 exposes `public`, v4 replaced it with `visibility`
        let private = meta
            .get("public")
            .and_then(Value::as_bool)
            .map(|public| !public)
            .or_else(|| {
                meta.get("visibility")
                    .and_then(Value::as_str)
                    .map(|v| v != "public")
            });

        RepoMeta {
            last_updated: timestamp_field(meta, "last_activity_at"),
            private,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArtifactType, Host};
    use serde_json::json;

    fn widget() -> RepoDescriptor {
        RepoDescriptor::new(Host::Gitlab, "acme", "widget", ArtifactType::Plugin)
    }

    #[test]
    fn test_endpoint_paths() {
        let host = GitLabHost;
        let repo = widget();
        let id = ProjectIdentity::Id(42);

        assert_eq!(host.endpoint_path(&Operation::Projects, None, &repo), "/projects");
        assert_eq!(
            host.endpoint_path(&Operation::Tags, Some(&id), &repo),
            "/projects/42/repository/tags"
        );
        assert_eq!(
            host.endpoint_path(&Operation::Readme, Some(&id), &repo),
            "/projects/42/repository/files?file_path=readme.txt"
        );
        assert_eq!(
            host.endpoint_path(&Operation::Branches, None, &repo),
            "/projects/acme%2Fwidget/repository/branches"
        );
    }

    #[test]
    fn test_archive_url() {
        let (url, query) = GitLabHost.archive_url(GITLAB_WEB, &widget(), Some("1.2"));
        assert_eq!(url, "https://gitlab.com/acme/widget/repository/archive.zip");
        assert_eq!(query, vec![("ref", "1.2".to_string())]);
    }

    #[test]
    fn test_map_meta() {
        let meta = json!({
            "id": 42,
            "path": "widget",
            "public": false,
            "last_activity_at": "2016-03-01T12:30:00.000Z"
        });
        let mapped = GitLabHost.map_meta(&meta);
        assert_eq!(mapped.private, Some(true));
        assert_eq!(
            mapped.last_updated.unwrap().to_rfc3339(),
            "2016-03-01T12:30:00+00:00"
        );

        let v4 = json!({ "visibility": "public" });
        assert_eq!(GitLabHost.map_meta(&v4).private, Some(false));

        // Missing fields stay unset
        assert_eq!(GitLabHost.map_meta(&json!({ "id": 1 })), RepoMeta::default());
    }
}
