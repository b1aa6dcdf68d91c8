//! One update-check cycle for a tracked repo.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::local::Credentials;
use crate::types::{RepoDescriptor, RollbackRequest};

use super::api::{ApiContext, RemoteApi};
use super::error::RemoteError;

/// Knobs that bypass the cache or the stale-skip.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleOptions {
    /// Drop cached fragments before fetching.
    pub refresh_cache: bool,
    /// Fetch branches even when no update is pending.
    pub branch_switch: bool,
}

/// Outcome of [`run_cycle`].
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub repo: RepoDescriptor,
    pub update_available: bool,
    /// User-facing message when the cycle could not run.
    pub notice: Option<String>,
    /// Fetchers that returned nothing or failed.
    pub failed: Vec<&'static str>,
}

impl CycleReport {
    fn new(repo: RepoDescriptor) -> Self {
        Self {
            repo,
            update_available: false,
            notice: None,
            failed: Vec::new(),
        }
    }
}

fn record(report: &mut Vec<&'static str>, step: &'static str, result: Result<bool, RemoteError>) {
    match result {
        Ok(true) => {}
        Ok(false) => report.push(step),
        Err(e) => {
            warn!(step, error = %e, "fetch failed");
            report.push(step);
        }
    }
}

/// Resolve everything known about `repo` and its download link.
///
/// A missing token ends the cycle with a notice; nothing is fetched. When the
/// header file cannot be read the remaining fetchers are skipped.
pub async fn run_cycle(
    repo: RepoDescriptor,
    credentials: Arc<Credentials>,
    ctx: &ApiContext,
    rollback: Option<&RollbackRequest>,
) -> CycleReport {
    let mut api = RemoteApi::new(repo, credentials, ctx);
    let slug = api.repo().full_name();

    if let Err(e) = api.check_credentials() {
        warn!(repo = %slug, "{}", e);
        let mut report = CycleReport::new(api.into_repo());
        report.notice = Some(e.to_string());
        return report;
    }

    if ctx.options.refresh_cache {
        api.clear_cache().await;
    }

    let mut failed = Vec::new();
    api.get_project_identity().await;

    let main_file = api.repo().main_file.clone();
    match api.get_remote_info(&main_file).await {
        Ok(true) => {
            record(&mut failed, "meta", api.get_repo_meta().await);
            record(&mut failed, "tags", api.get_remote_tag().await);

            let changelog = api.repo().changelog_file.clone();
            record(&mut failed, "changes", api.get_remote_changes(&changelog).await);
            record(&mut failed, "readme", api.get_remote_readme().await);
            record(&mut failed, "branches", api.get_remote_branches().await);

            let link = api.construct_download_link(rollback, None);
            api.repo_mut().download_link = Some(link);
        }
        result => record(&mut failed, "info", result),
    }

    let repo = api.into_repo();
    let update_available = repo.can_update();
    info!(
        repo = %slug,
        local = repo.local_version.as_deref().unwrap_or("-"),
        remote = repo.remote_version.as_deref().unwrap_or("-"),
        update_available,
        "checked"
    );

    CycleReport {
        repo,
        update_available,
        notice: None,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::MemoryStore;
    use crate::remote::{HttpResponse, MockTransport};
    use crate::remote::provider::encode_content;
    use crate::types::{ArtifactType, Host};
    use chrono::Duration;
    use secrecy::SecretString;

    fn ctx(transport: MockTransport, options: CycleOptions) -> ApiContext {
        ApiContext {
            transport: Arc::new(transport),
            store: Arc::new(MemoryStore::new()),
            ttl: Duration::hours(12),
            options,
        }
    }

    fn token() -> Arc<Credentials> {
        Arc::new(Credentials {
            public_token: Some(SecretString::from("tok".to_string())),
            enterprise_token: None,
        })
    }

    #[tokio::test]
    async fn test_missing_token_is_notice() {
        let mut transport = MockTransport::new();
        transport.expect_get().never();

        let repo = RepoDescriptor::new(Host::Gitlab, "acme", "widget", ArtifactType::Plugin);
        let report = run_cycle(
            repo,
            Arc::new(Credentials::default()),
            &ctx(transport, CycleOptions::default()),
            None,
        )
        .await;

        assert!(report.notice.unwrap().contains("set-token gitlab"));
        assert!(!report.update_available);
        assert!(report.repo.download_link.is_none());
    }

    #[tokio::test]
    async fn test_full_cycle() {
        let header = "<?php\n/*\n * Plugin Name: Widget\n * Version: 1.2\n */";
        let file_body = encode_content(header).to_string();
        let changes_body = encode_content("#### 1.2\n* new").to_string();

        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|url| url.contains("/api/v3/projects?"))
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::ok(
                    r#"[{"path": "widget", "id": 42, "public": true}]"#,
                ))
            });
        transport
            .expect_get()
            .withf(|url| url.contains("file_path=widget.php"))
            .times(1)
            .returning(move |_| Ok(HttpResponse::ok(file_body.clone())));
        transport
            .expect_get()
            .withf(|url| url.contains("/repository/tags"))
            .times(1)
            .returning(|_| Ok(HttpResponse::ok(r#"[{"name": "1.0"}, {"name": "1.2"}]"#)));
        transport
            .expect_get()
            .withf(|url| url.contains("file_path=CHANGES.md"))
            .times(1)
            .returning(move |_| Ok(HttpResponse::ok(changes_body.clone())));
        transport
            .expect_get()
            .withf(|url| url.contains("/repository/branches"))
            .times(1)
            .returning(|_| Ok(HttpResponse::ok(r#"[{"name": "master"}]"#)));

        let mut repo = RepoDescriptor::new(Host::Gitlab, "acme", "widget", ArtifactType::Plugin);
        repo.local_version = Some("1.0".to_string());

        let report = run_cycle(repo, token(), &ctx(transport, CycleOptions::default()), None).await;

        assert!(report.notice.is_none());
        assert!(report.update_available);
        assert_eq!(report.repo.remote_version.as_deref(), Some("1.2"));
        assert_eq!(report.repo.newest_tag.as_deref(), Some("1.2"));
        assert_eq!(report.repo.private, Some(false));
        assert!(report.repo.sections["changelog"].contains("<li>new</li>"));
        assert_eq!(
            report.repo.download_link.as_deref(),
            Some("https://gitlab.com/acme/widget/repository/archive.zip?ref=1.2&private_token=tok")
        );
        // No local readme to compare against
        assert_eq!(report.failed, vec!["readme"]);
    }

    #[tokio::test]
    async fn test_unreadable_header_skips_rest() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .times(1)
            .returning(|_| {
                Ok(HttpResponse {
                    status: 404,
                    body: r#"{"message": "Not Found"}"#.to_string(),
                })
            });

        let repo = RepoDescriptor::new(Host::Github, "acme", "widget", ArtifactType::Plugin);
        let report = run_cycle(
            repo,
            Arc::new(Credentials::default()),
            &ctx(transport, CycleOptions::default()),
            None,
        )
        .await;

        assert_eq!(report.failed, vec!["info"]);
        assert!(report.repo.download_link.is_none());
    }
}
