//! Local configuration management.
//!
//! Config is stored at `~/.config/gitup/config.toml` and contains:
//! - Access tokens per provider (public host and enterprise host)
//! - Cache lifetime and check concurrency
//! - The list of tracked repos

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::local::cache::{DEFAULT_TTL_HOURS, MAX_TTL_HOURS};
use crate::types::{ArtifactType, Host, RepoDescriptor};

const CONFIG_DIR: &str = "gitup";
const CONFIG_FILE: &str = "config.toml";
const CACHE_FILE: &str = "cache.sqlite";

/// Tokens for one provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostTokens {
    /// Token for the public hosted service (gitlab.com, github.com).
    #[serde(default)]
    pub public_token: Option<String>,

    /// Token for a self-hosted instance.
    #[serde(default)]
    pub enterprise_token: Option<String>,
}

/// Credentials handed to the resolution engine.
#[derive(Debug, Default)]
pub struct Credentials {
    pub public_token: Option<SecretString>,
    pub enterprise_token: Option<SecretString>,
}

impl Credentials {
    /// Token for the selected base, never both.
    pub fn token_for(&self, enterprise: bool) -> Option<&SecretString> {
        if enterprise {
            self.enterprise_token.as_ref()
        } else {
            self.public_token.as_ref()
        }
    }
}

impl From<&HostTokens> for Credentials {
    fn from(tokens: &HostTokens) -> Self {
        let secret = |t: &Option<String>| {
            t.as_ref()
                .filter(|t| !t.is_empty())
                .map(|t| SecretString::from(t.clone()))
        };
        Self {
            public_token: secret(&tokens.public_token),
            enterprise_token: secret(&tokens.enterprise_token),
        }
    }
}

/// A tracked repo as written in config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoEntry {
    pub host: Host,
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub artifact: ArtifactType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise_api: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path_extended: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_version: Option<String>,
    /// Header file, defaults to `{repo}.php` or `style.css`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog_file: Option<String>,
}

impl RepoEntry {
    /// Build the descriptor a check cycle starts from.
    pub fn to_descriptor(&self) -> RepoDescriptor {
        let mut repo = RepoDescriptor::new(self.host, &self.owner, &self.repo, self.artifact);
        repo.branch = self.branch.clone();
        if let Some(default_branch) = &self.default_branch {
            repo.default_branch = default_branch.clone();
        }
        repo.enterprise = self.enterprise.clone();
        repo.enterprise_api = self.enterprise_api.clone();
        repo.local_path = self.local_path.clone();
        repo.local_path_extended = self.local_path_extended.clone();
        repo.local_version = self.local_version.clone();
        if let Some(file) = &self.main_file {
            repo.main_file = file.clone();
        }
        if let Some(file) = &self.changelog_file {
            repo.changelog_file = file.clone();
        }
        repo
    }
}

/// Local configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default)]
    pub gitlab: HostTokens,

    #[serde(default)]
    pub github: HostTokens,

    /// Hours a cached response stays valid (default: 12).
    #[serde(default = "default_cache_hours")]
    pub cache_hours: i64,

    /// Repos checked concurrently (default: 4).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub repos: Vec<RepoEntry>,
}

fn default_cache_hours() -> i64 {
    DEFAULT_TTL_HOURS
}

fn default_concurrency() -> usize {
    4
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            gitlab: HostTokens::default(),
            github: HostTokens::default(),
            cache_hours: default_cache_hours(),
            concurrency: default_concurrency(),
            repos: Vec::new(),
        }
    }
}

impl LocalConfig {
    /// Load config from `path`, defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        toml::from_str(&content).context("Failed to parse config file")
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, content).context("Failed to write config file")
    }

    pub fn tokens(&self, host: Host) -> &HostTokens {
        match host {
            Host::Gitlab => &self.gitlab,
            Host::Github => &self.github,
        }
    }

    pub fn tokens_mut(&mut self, host: Host) -> &mut HostTokens {
        match host {
            Host::Gitlab => &mut self.gitlab,
            Host::Github => &mut self.github,
        }
    }

    /// Cache lifetime, clamped to between one hour and one year.
    pub fn cache_ttl(&self) -> Duration {
        Duration::hours(self.cache_hours.clamp(1, MAX_TTL_HOURS))
    }

    /// Credentials for a provider, with tokens wrapped as secrets.
    pub fn credentials(&self, host: Host) -> Credentials {
        Credentials::from(self.tokens(host))
    }

    /// Set a provider token.
    pub fn set_token(&mut self, host: Host, token: String, enterprise: bool) {
        let tokens = self.tokens_mut(host);
        if enterprise {
            tokens.enterprise_token = Some(token);
        } else {
            tokens.public_token = Some(token);
        }
    }

    /// Find a tracked repo by slug.
    pub fn find_repo(&self, slug: &str) -> Option<&RepoEntry> {
        self.repos.iter().find(|r| r.repo == slug)
    }

    /// Add a repo, replacing any entry with the same host and slug.
    pub fn upsert_repo(&mut self, entry: RepoEntry) {
        self.repos
            .retain(|r| !(r.host == entry.host && r.repo == entry.repo));
        self.repos.push(entry);
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get the response cache database path.
    pub fn cache_path() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir().context("Could not determine cache directory")?;

        Ok(cache_dir.join(CONFIG_DIR).join(CACHE_FILE))
    }
}
