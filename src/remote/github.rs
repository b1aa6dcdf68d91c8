//! GitHub (github.com and GitHub Enterprise).

use serde_json::Value;

use crate::types::RepoDescriptor;

use super::provider::{GitHost, Operation, ProjectIdentity, RepoMeta, timestamp_field};

const GITHUB_API: &str = "https://api.github.com";

/// GitHub addresses repos by `owner/repo` and authenticates with `access_token`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubHost;

impl GitHost for GitHubHost {
    fn api_base(&self) -> &'static str {
        GITHUB_API
    }

    fn enterprise_api_prefix(&self, enterprise: &str) -> String {
        format!("{}/api/v3", enterprise)
    }

    fn token_param(&self, _enterprise: bool) -> &'static str {
        "access_token"
    }

    // Public repos resolve without a token
    fn requires_tokens(&self) -> bool {
        false
    }

    fn addresses_by_id(&self) -> bool {
        false
    }

    fn endpoint_path(
        &self,
        op: &Operation,
        project: Option<&ProjectIdentity>,
        repo: &RepoDescriptor,
    ) -> String {
        let full_name = match project {
            Some(ProjectIdentity::Path(path)) => path.clone(),
            _ => repo.full_name(),
        };

        match op {
            Operation::Projects => format!("/users/{}/repos", repo.owner),
            Operation::Meta => format!("/repos/{}", full_name),
            Operation::Tags => format!("/repos/{}/tags", full_name),
            Operation::Branches => format!("/repos/{}/branches", full_name),
            Operation::File(_) | Operation::Changes(_) | Operation::Readme => format!(
                "/repos/{}/contents/{}",
                full_name,
                op.file_path().unwrap_or_default()
            ),
        }
    }

    fn download_base(&self) -> &'static str {
        GITHUB_API
    }

    fn enterprise_download_base(&self, enterprise: &str) -> String {
        self.enterprise_api_prefix(enterprise)
    }

    fn archive_url(
        &self,
        base: &str,
        repo: &RepoDescriptor,
        git_ref: Option<&str>,
    ) -> (String, Vec<(&'static str, String)>) {
        let mut url = format!("{}/repos/{}/{}/zipball", base, repo.owner, repo.repo);
        if let Some(git_ref) = git_ref {
            url.push('/');
            url.push_str(git_ref);
        }
        (url, Vec::new())
    }

    fn meta_from_projects(&self) -> bool {
        false
    }

    fn map_meta(&self, meta: &Value) -> RepoMeta {
        RepoMeta {
            last_updated: timestamp_field(meta, "pushed_at"),
            private: meta.get("private").and_then(Value::as_bool),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArtifactType, Host};
    use serde_json::json;

    fn widget() -> RepoDescriptor {
        RepoDescriptor::new(Host::Github, "acme", "widget", ArtifactType::Plugin)
    }

    #[test]
    fn test_endpoint_paths() {
        let host = GitHubHost;
        let repo = widget();
        let path = ProjectIdentity::Path("acme/widget".to_string());

        assert_eq!(host.endpoint_path(&Operation::Meta, Some(&path), &repo), "/repos/acme/widget");
        assert_eq!(
            host.endpoint_path(&Operation::File("widget.php".into()), Some(&path), &repo),
            "/repos/acme/widget/contents/widget.php"
        );
        assert_eq!(
            host.endpoint_path(&Operation::Tags, None, &repo),
            "/repos/acme/widget/tags"
        );
    }

    #[test]
    fn test_archive_url_puts_ref_in_path() {
        let (url, query) = GitHubHost.archive_url(GITHUB_API, &widget(), Some("1.2"));
        assert_eq!(url, "https://api.github.com/repos/acme/widget/zipball/1.2");
        assert!(query.is_empty());

        let (url, _) = GitHubHost.archive_url(GITHUB_API, &widget(), None);
        assert_eq!(url, "https://api.github.com/repos/acme/widget/zipball");
    }

    #[test]
    fn test_map_meta() {
        let meta = json!({ "private": true, "pushed_at": "2016-03-01T12:30:00Z" });
        let mapped = GitHubHost.map_meta(&meta);
        assert_eq!(mapped.private, Some(true));
        assert!(mapped.last_updated.is_some());
    }
}
