use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text::readme::StructuredReadme;

use super::version::is_newer;

/// Branch assumed when a repo does not name one.
pub const DEFAULT_BRANCH: &str = "master";

/// Changelog file looked up when a repo does not name one.
pub const DEFAULT_CHANGELOG: &str = "CHANGES.md";

/// Git hosting providers we resolve updates from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Host {
    #[default]
    Gitlab,
    Github,
}

impl Host {
    pub fn as_str(&self) -> &'static str {
        match self {
            Host::Gitlab => "gitlab",
            Host::Github => "github",
        }
    }
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Host {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gitlab" => Ok(Host::Gitlab),
            "github" => Ok(Host::Github),
            _ => Err(format!("unknown host: {}", s)),
        }
    }
}

/// What kind of artifact a repo ships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    #[default]
    Plugin,
    Theme,
}

impl ArtifactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactType::Plugin => "plugin",
            ArtifactType::Theme => "theme",
        }
    }
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Explicit request to install an older version of one repo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackRequest {
    /// Repo slug the rollback targets.
    pub repo: String,
    /// Tag or ref to roll back to.
    pub version: String,
}

/// One tracked remote repository and everything resolved about it.
///
/// # Lifecycle
/// 1. Built from config at registration (identity fields only)
/// 2. Filled in field by field as each fetcher succeeds
/// 3. Dropped at the end of the update-check cycle
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepoDescriptor {
    pub host: Host,
    pub owner: String,
    pub repo: String,
    pub artifact: ArtifactType,
    /// Branch to track; `None` means the default branch.
    pub branch: Option<String>,
    pub default_branch: String,
    /// Self-hosted web base, e.g. `https://git.example.com`.
    pub enterprise: Option<String>,
    /// Self-hosted API base when it lives apart from the web base.
    pub enterprise_api: Option<String>,
    pub local_path: Option<PathBuf>,
    pub local_path_extended: Option<PathBuf>,
    /// Installed version, if any.
    pub local_version: Option<String>,
    /// File carrying the header block (`widget.php`, `style.css`).
    pub main_file: String,
    pub changelog_file: String,

    // Resolved during the cycle
    pub remote_version: Option<String>,
    pub requires_wp: Option<String>,
    pub requires_php: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub newest_tag: Option<String>,
    pub rollback: BTreeMap<String, String>,
    pub branches: BTreeMap<String, String>,
    pub repo_meta: Option<serde_json::Value>,
    pub last_updated: Option<DateTime<Utc>>,
    pub private: Option<bool>,
    pub readme: Option<StructuredReadme>,
    pub tested: Option<String>,
    pub requires: Option<String>,
    pub sections: BTreeMap<String, String>,
    pub download_link: Option<String>,
}

impl RepoDescriptor {
    pub fn new(host: Host, owner: &str, repo: &str, artifact: ArtifactType) -> Self {
        Self {
            host,
            owner: owner.to_string(),
            repo: repo.to_string(),
            artifact,
            default_branch: DEFAULT_BRANCH.to_string(),
            main_file: match artifact {
                ArtifactType::Plugin => format!("{}.php", repo),
                ArtifactType::Theme => "style.css".to_string(),
            },
            changelog_file: DEFAULT_CHANGELOG.to_string(),
            ..Default::default()
        }
    }

    /// Branch in effect, falling back to the default branch.
    pub fn branch(&self) -> &str {
        match self.branch.as_deref() {
            Some(b) if !b.is_empty() => b,
            _ => self.default_branch(),
        }
    }

    pub fn default_branch(&self) -> &str {
        if self.default_branch.is_empty() {
            DEFAULT_BRANCH
        } else {
            &self.default_branch
        }
    }

    /// Enterprise web base, ignoring empty strings.
    pub fn enterprise_base(&self) -> Option<&str> {
        self.enterprise.as_deref().filter(|e| !e.is_empty())
    }

    /// Enterprise API base, ignoring empty strings.
    pub fn enterprise_api_base(&self) -> Option<&str> {
        self.enterprise_api.as_deref().filter(|e| !e.is_empty())
    }

    /// True when requests go to a self-hosted instance.
    pub fn is_enterprise(&self) -> bool {
        self.enterprise_base().is_some() || self.enterprise_api_base().is_some()
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Whether the remote version is newer than what is installed.
    ///
    /// A missing local version counts as older than any remote version.
    pub fn can_update(&self) -> bool {
        match self.remote_version.as_deref() {
            Some(remote) => match self.local_version.as_deref() {
                Some(local) => is_newer(remote, local),
                None => true,
            },
            None => false,
        }
    }

    /// Candidate locations of a bundled file, in lookup order.
    pub fn local_candidates(&self, file: &str) -> Vec<PathBuf> {
        [&self.local_path, &self.local_path_extended]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(file))
            .collect()
    }
}
