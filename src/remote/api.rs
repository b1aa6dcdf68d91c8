//! Remote info fetchers.
//!
//! Every fetcher has the same shape:
//! 1. Use the cached fragment if there is one
//! 2. Otherwise read the bundled local file, when no update is pending
//! 3. Otherwise call the provider API
//! 4. Validate the payload and fold it into the repo descriptor
//!
//! Expected misses return `Ok(false)`; only broken content (bad base64,
//! unreadable local files) surfaces as an error.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::local::files::{local_file_exists, read_local_file};
use crate::local::{CacheKey, CacheStore, Credentials, ResponseCache};
use crate::text::{StructuredReadme, parse_file_headers, parse_readme, render_markdown};
use crate::types::version::sort_versions;
use crate::types::{ArtifactType, RepoDescriptor};

use super::GitHosts;
use super::cycle::CycleOptions;
use super::download::archive_link;
use super::endpoint::build_endpoint;
use super::error::RemoteError;
use super::provider::{
    GitHost, Operation, ProjectIdentity, Shape, decode_content, encode_content, find_project,
    is_usable, ref_names,
};
use super::transport::Transport;

const README_FILE: &str = "readme.txt";

/// Shared collaborators for every repo in a cycle.
#[derive(Clone)]
pub struct ApiContext {
    pub transport: Arc<dyn Transport>,
    pub store: Arc<dyn CacheStore>,
    pub ttl: Duration,
    pub options: CycleOptions,
}

/// Update resolution for a single repo.
pub struct RemoteApi {
    pub(super) host: GitHosts,
    pub(super) repo: RepoDescriptor,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) cache: ResponseCache,
    pub(super) credentials: Arc<Credentials>,
    pub(super) options: CycleOptions,
    /// Memoized project identity; `Some(None)` means resolution found nothing.
    pub(super) project: Option<Option<ProjectIdentity>>,
}

impl RemoteApi {
    pub fn new(repo: RepoDescriptor, credentials: Arc<Credentials>, ctx: &ApiContext) -> Self {
        let cache = ResponseCache::new(ctx.store.clone(), &repo, ctx.ttl);
        Self {
            host: GitHosts::new(repo.host),
            repo,
            transport: ctx.transport.clone(),
            cache,
            credentials,
            options: ctx.options,
            project: None,
        }
    }

    pub fn repo(&self) -> &RepoDescriptor {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut RepoDescriptor {
        &mut self.repo
    }

    pub fn into_repo(self) -> RepoDescriptor {
        self.repo
    }

    /// Refuse to run when the provider needs a token that is not configured.
    pub fn check_credentials(&self) -> Result<(), RemoteError> {
        if !self.host.requires_tokens() {
            return Ok(());
        }
        if self.credentials.public_token.is_none() {
            return Err(RemoteError::missing_token(self.repo.host, false));
        }
        if self.repo.is_enterprise() && self.credentials.enterprise_token.is_none() {
            return Err(RemoteError::missing_token(self.repo.host, true));
        }
        Ok(())
    }

    /// Drop all cached fragments for this repo.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// One GET against the provider API; failures are logged and yield `None`.
    pub(super) async fn api(
        &self,
        op: Operation,
        project: Option<&ProjectIdentity>,
    ) -> Option<Value> {
        let url = build_endpoint(&self.host, &op, project, &self.repo, &self.credentials);
        let repo = self.repo.full_name();
        debug!(repo = %repo, op = op.name(), "requesting");

        let response = match self.transport.get(&url).await {
            Ok(response) => response,
            Err(e) => {
                warn!(repo = %repo, op = op.name(), error = %e, "request failed");
                return None;
            }
        };

        if !response.is_success() {
            warn!(repo = %repo, op = op.name(), status = response.status, "unexpected status");
            return None;
        }

        match serde_json::from_str(&response.body) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(repo = %repo, op = op.name(), error = %e, "response is not JSON");
                None
            }
        }
    }

    /// Nothing cached, nothing forced and nothing to update: skip the network.
    fn exit_no_update(&self, cached: bool) -> bool {
        !self.options.refresh_cache && !cached && !self.repo.can_update()
    }

    /// Read the remote header file and record its version headers.
    pub async fn get_remote_info(&mut self, file: &str) -> Result<bool, RemoteError> {
        let mut response = self.cache.get(CacheKey::File).await;

        if response.is_none() {
            let Some(project) = self.get_project_identity().await else {
                return Ok(false);
            };
            let Some(payload) = self.api(Operation::File(file.to_string()), Some(&project)).await
            else {
                return Ok(false);
            };
            let Some(contents) = decode_content(&payload)? else {
                return Ok(false);
            };

            let headers = parse_file_headers(&contents, self.repo.artifact);
            let value = serde_json::to_value(&headers)?;
            self.cache.put(CacheKey::File, &value).await;
            response = Some(value);
        }

        let Some(response) = response.filter(|r| is_usable(r, Shape::Object)) else {
            return Ok(false);
        };
        let Ok(headers) = serde_json::from_value::<BTreeMap<String, String>>(response) else {
            return Ok(false);
        };

        self.set_file_info(headers);
        Ok(true)
    }

    /// Fetch tags and pick the newest.
    pub async fn get_remote_tag(&mut self) -> Result<bool, RemoteError> {
        let mut response = self.cache.get(CacheKey::Tags).await;

        if self.exit_no_update(response.is_some()) && self.repo.artifact != ArtifactType::Theme {
            debug!(repo = %self.repo.full_name(), "no update pending, skipping tags");
            return Ok(false);
        }

        if response.is_none() {
            let Some(project) = self.get_project_identity().await else {
                return Ok(false);
            };
            // Cache the miss too, so the next call within the TTL stays offline
            let payload = self
                .api(Operation::Tags, Some(&project))
                .await
                .filter(|v| is_usable(v, Shape::Array))
                .unwrap_or_else(|| json!({ "message": "No tags found" }));
            self.cache.put(CacheKey::Tags, &payload).await;
            response = Some(payload);
        }

        let Some(response) = response.filter(|r| is_usable(r, Shape::Array)) else {
            return Ok(false);
        };

        self.set_tags(&response);
        Ok(true)
    }

    /// Fetch the changelog and render it into `sections["changelog"]`.
    pub async fn get_remote_changes(&mut self, changes: &str) -> Result<bool, RemoteError> {
        let mut response = self.cache.get(CacheKey::Changes).await;

        if response.is_none() && !self.repo.can_update() {
            if let Some(text) = read_local_file(&self.repo, changes).await? {
                let payload = encode_content(&text);
                self.cache.put(CacheKey::Changes, &payload).await;
                response = Some(payload);
            }
        }

        if response.is_none() {
            let Some(project) = self.get_project_identity().await else {
                return Ok(false);
            };
            if let Some(payload) = self
                .api(Operation::Changes(changes.to_string()), Some(&project))
                .await
            {
                self.cache.put(CacheKey::Changes, &payload).await;
                response = Some(payload);
            }
        }

        let Some(response) = response.filter(|r| is_usable(r, Shape::Object)) else {
            return Ok(false);
        };

        let cached = self
            .cache
            .get(CacheKey::Changelog)
            .await
            .and_then(|v| v.as_str().map(str::to_string));

        let changelog = match cached {
            Some(html) => html,
            None => {
                let Some(text) = decode_content(&response)? else {
                    return Ok(false);
                };
                let html = render_markdown(&text);
                self.cache
                    .put(CacheKey::Changelog, &Value::String(html.clone()))
                    .await;
                html
            }
        };

        self.repo.sections.insert("changelog".to_string(), changelog);
        Ok(true)
    }

    /// Fetch and parse `readme.txt`.
    ///
    /// Only repos that ship a readme locally are looked up remotely.
    pub async fn get_remote_readme(&mut self) -> Result<bool, RemoteError> {
        if !local_file_exists(&self.repo, README_FILE) {
            return Ok(false);
        }

        let mut response = self.cache.get(CacheKey::Readme).await;

        if response.is_none() && !self.repo.can_update() {
            if let Some(text) = read_local_file(&self.repo, README_FILE).await? {
                let parsed = serde_json::to_value(parse_readme(&text))?;
                self.cache.put(CacheKey::Readme, &parsed).await;
                response = Some(parsed);
            }
        }

        if response.is_none() {
            let Some(project) = self.get_project_identity().await else {
                return Ok(false);
            };
            if let Some(payload) = self.api(Operation::Readme, Some(&project)).await {
                if let Some(text) = decode_content(&payload)? {
                    let parsed = serde_json::to_value(parse_readme(&text))?;
                    self.cache.put(CacheKey::Readme, &parsed).await;
                    response = Some(parsed);
                }
            }
        }

        let Some(response) = response.filter(|r| is_usable(r, Shape::Object)) else {
            return Ok(false);
        };
        let Ok(readme) = serde_json::from_value::<StructuredReadme>(response) else {
            return Ok(false);
        };

        self.set_readme_info(readme);
        Ok(true)
    }

    /// Fetch repository metadata (visibility, last activity).
    pub async fn get_repo_meta(&mut self) -> Result<bool, RemoteError> {
        let mut response = self.cache.get(CacheKey::Meta).await;

        if response.is_none() {
            if self.host.meta_from_projects() {
                let Some(projects) = self.cache.get(CacheKey::Projects).await else {
                    return Ok(false);
                };
                response = find_project(&projects, &self.repo.repo).cloned();
            } else {
                let project = self.get_project_identity().await;
                response = self.api(Operation::Meta, project.as_ref()).await;
            }

            if let Some(meta) = &response {
                self.cache.put(CacheKey::Meta, meta).await;
            }
        }

        let Some(meta) = response.filter(|r| is_usable(r, Shape::Object)) else {
            return Ok(false);
        };

        let mapped = self.host.map_meta(&meta);
        self.repo.last_updated = mapped.last_updated;
        self.repo.private = mapped.private;
        self.repo.repo_meta = Some(meta);
        Ok(true)
    }

    /// Fetch branches and build a download link for each.
    ///
    /// Only branch names are cached. Links carry tokens, so they are rebuilt
    /// from the current credentials on every read.
    pub async fn get_remote_branches(&mut self) -> Result<bool, RemoteError> {
        if let Some(cached) = self.cache.get(CacheKey::Branches).await {
            if !is_usable(&cached, Shape::Array) {
                return Ok(false);
            }
            let Ok(names) = serde_json::from_value::<Vec<String>>(cached) else {
                return Ok(false);
            };
            self.set_branches(names);
            return Ok(true);
        }

        if !self.options.branch_switch && !self.repo.can_update() {
            debug!(repo = %self.repo.full_name(), "no update pending, skipping branches");
            return Ok(false);
        }

        let Some(project) = self.get_project_identity().await else {
            return Ok(false);
        };
        let Some(listing) = self.api(Operation::Branches, Some(&project)).await else {
            return Ok(false);
        };
        if !is_usable(&listing, Shape::Array) {
            return Ok(false);
        }

        let names = ref_names(&listing);
        self.cache
            .put(CacheKey::Branches, &serde_json::to_value(&names)?)
            .await;
        self.set_branches(names);
        Ok(true)
    }

    fn set_branches(&mut self, names: Vec<String>) {
        let branches: BTreeMap<String, String> = names
            .into_iter()
            .map(|name| {
                let link = self.construct_download_link(None, Some(&name));
                (name, link)
            })
            .collect();
        self.repo.branches = branches;
    }

    fn set_file_info(&mut self, headers: BTreeMap<String, String>) {
        self.repo.remote_version = headers.get("Version").map(|v| v.to_lowercase());
        self.repo.requires_wp = headers.get("Requires WP").cloned();
        self.repo.requires_php = headers.get("Requires PHP").cloned();
        self.repo.headers = headers;
    }

    fn set_tags(&mut self, listing: &Value) {
        let mut tags = ref_names(listing);
        sort_versions(&mut tags);

        let rollback = tags
            .iter()
            .map(|tag| {
                let link = archive_link(&self.host, &self.repo, &self.credentials, Some(tag));
                (tag.clone(), link)
            })
            .collect();

        self.repo.newest_tag = tags.last().cloned();
        self.repo.tags = tags;
        self.repo.rollback = rollback;
    }

    fn set_readme_info(&mut self, readme: StructuredReadme) {
        if readme.tested.is_some() {
            self.repo.tested = readme.tested.clone();
        }
        if readme.requires.is_some() {
            self.repo.requires = readme.requires.clone();
        }
        // A changelog from the changes file wins over the readme's
        for (key, html) in &readme.sections {
            self.repo
                .sections
                .entry(key.clone())
                .or_insert_with(|| html.clone());
        }
        self.repo.readme = Some(readme);
    }
}
