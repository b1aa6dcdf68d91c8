//! Archive download links.

use crate::local::Credentials;
use crate::types::{RepoDescriptor, RollbackRequest};

use super::api::RemoteApi;
use super::endpoint::push_token;
use super::provider::{GitHost, with_query};

/// Archive URL for `git_ref`, authenticated for the chosen base.
pub(super) fn archive_link<H: GitHost + ?Sized>(
    host: &H,
    repo: &RepoDescriptor,
    credentials: &Credentials,
    git_ref: Option<&str>,
) -> String {
    let enterprise = repo.enterprise_base().map(|e| e.trim_end_matches('/'));
    let base = match enterprise {
        Some(enterprise) => host.enterprise_download_base(enterprise),
        None => host.download_base().to_string(),
    };

    let (url, mut query) = host.archive_url(&base, repo, git_ref);
    push_token(host, credentials, enterprise.is_some(), &mut query);
    with_query(url, &query)
}

/// Download link for the version an update should install.
///
/// Ref precedence, last one wins:
/// 1. the tracked branch, or the rollback version if one targets this repo
/// 2. the newest tag, when tracking the default branch and tags exist
/// 3. an explicit branch switch
pub fn download_link<H: GitHost + ?Sized>(
    host: &H,
    repo: &RepoDescriptor,
    credentials: &Credentials,
    rollback: Option<&RollbackRequest>,
    branch_switch: Option<&str>,
) -> String {
    let mut git_ref = match rollback.filter(|r| r.repo == repo.repo && !r.version.is_empty()) {
        Some(rollback) => rollback.version.clone(),
        None => repo.branch().to_string(),
    };

    if repo.branch() == repo.default_branch() && !repo.tags.is_empty() {
        if let Some(newest) = &repo.newest_tag {
            git_ref = newest.clone();
        }
    }

    if let Some(branch) = branch_switch.filter(|b| !b.is_empty()) {
        git_ref = branch.to_string();
    }

    archive_link(host, repo, credentials, Some(&git_ref))
}

/// Download link for a specific tag, bypassing tag tracking.
///
/// Uses the link resolved for that tag when there is one.
pub fn rollback_link<H: GitHost + ?Sized>(
    host: &H,
    repo: &RepoDescriptor,
    credentials: &Credentials,
    version: &str,
) -> String {
    match repo.rollback.get(version) {
        Some(link) => link.clone(),
        None => archive_link(host, repo, credentials, Some(version)),
    }
}

impl RemoteApi {
    pub fn construct_download_link(
        &self,
        rollback: Option<&RollbackRequest>,
        branch_switch: Option<&str>,
    ) -> String {
        download_link(
            &self.host,
            &self.repo,
            &self.credentials,
            rollback,
            branch_switch,
        )
    }
}
