//! Remote update resolution against Git hosting providers.
//!
//! One [`RemoteApi`] is built per tracked repo per check cycle. Each fetcher
//! consults the response cache, then the provider API, then (where allowed)
//! the repo's bundled files, and folds the result into the repo descriptor.
//!
//! # Example
//!
//! ```ignore
//! use crate::remote::{ApiContext, RemoteApi};
//!
//! let mut api = RemoteApi::new(repo, credentials, &ctx);
//! if api.get_remote_info("widget.php").await? {
//!     api.get_remote_tag().await?;
//!     let link = api.construct_download_link(None, None);
//! }
//! ```

mod api;
pub mod cycle;
mod download;
mod endpoint;
mod error;
mod github;
mod gitlab;
mod provider;
mod resolver;
mod transport;

pub use api::{ApiContext, RemoteApi};
pub use cycle::{CycleOptions, CycleReport, run_cycle};
pub use download::{download_link, rollback_link};
pub use endpoint::build_endpoint;
pub use error::RemoteError;
pub use github::GitHubHost;
pub use gitlab::GitLabHost;
pub use provider::{GitHost, Operation, ProjectIdentity, RepoMeta};
pub use transport::{HttpResponse, ReqwestTransport, Transport};

#[cfg(test)]
pub use transport::MockTransport;

use serde_json::Value;

use crate::types::{Host, RepoDescriptor};

/// Provider implementation selected by a repo's host.
#[derive(Debug, Clone, Copy)]
pub enum GitHosts {
    Gitlab(GitLabHost),
    Github(GitHubHost),
}

impl GitHosts {
    pub fn new(host: Host) -> Self {
        match host {
            Host::Gitlab => Self::Gitlab(GitLabHost),
            Host::Github => Self::Github(GitHubHost),
        }
    }

    fn inner(&self) -> &dyn GitHost {
        match self {
            Self::Gitlab(h) => h,
            Self::Github(h) => h,
        }
    }
}

impl GitHost for GitHosts {
    fn api_base(&self) -> &'static str {
        self.inner().api_base()
    }

    fn enterprise_api_prefix(&self, enterprise: &str) -> String {
        self.inner().enterprise_api_prefix(enterprise)
    }

    fn token_param(&self, enterprise: bool) -> &'static str {
        self.inner().token_param(enterprise)
    }

    fn requires_tokens(&self) -> bool {
        self.inner().requires_tokens()
    }

    fn addresses_by_id(&self) -> bool {
        self.inner().addresses_by_id()
    }

    fn endpoint_path(
        &self,
        op: &Operation,
        project: Option<&ProjectIdentity>,
        repo: &RepoDescriptor,
    ) -> String {
        self.inner().endpoint_path(op, project, repo)
    }

    fn download_base(&self) -> &'static str {
        self.inner().download_base()
    }

    fn enterprise_download_base(&self, enterprise: &str) -> String {
        self.inner().enterprise_download_base(enterprise)
    }

    fn archive_url(
        &self,
        base: &str,
        repo: &RepoDescriptor,
        git_ref: Option<&str>,
    ) -> (String, Vec<(&'static str, String)>) {
        self.inner().archive_url(base, repo, git_ref)
    }

    fn meta_from_projects(&self) -> bool {
        self.inner().meta_from_projects()
    }

    fn map_meta(&self, meta: &Value) -> RepoMeta {
        self.inner().map_meta(meta)
    }
}
