//! Config command - manage tokens and tracked repos.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::local::{LocalConfig, RepoEntry};
use crate::types::{ArtifactType, Host};

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub command: ConfigSubCmd,
}

#[derive(Subcommand)]
pub enum ConfigSubCmd {
    /// Set an access token for a provider
    SetToken(SetTokenCmd),

    /// Track a repo (replaces an existing entry with the same slug)
    AddRepo(AddRepoCmd),

    /// Stop tracking a repo
    RemoveRepo(RemoveRepoCmd),

    /// Show current configuration
    Show,
}

#[derive(Args)]
pub struct SetTokenCmd {
    #[arg(value_enum)]
    pub host: Host,

    pub token: String,

    /// Token for the self-hosted instance
    #[arg(long)]
    pub enterprise: bool,
}

#[derive(Args)]
pub struct AddRepoCmd {
    /// `owner/repo`
    pub slug: String,

    #[arg(long, value_enum, default_value_t = Host::Gitlab)]
    pub host: Host,

    #[arg(long, value_enum, default_value_t = ArtifactType::Plugin)]
    pub artifact: ArtifactType,

    /// Branch to track (default: the default branch)
    #[arg(long)]
    pub branch: Option<String>,

    /// Name of the repo's default branch (default: master)
    #[arg(long)]
    pub default_branch: Option<String>,

    /// Self-hosted web base, e.g. https://git.example.com
    #[arg(long)]
    pub enterprise: Option<String>,

    /// Self-hosted API base when it differs from the web base
    #[arg(long)]
    pub enterprise_api: Option<String>,

    /// Installed copy, used for local fallbacks
    #[arg(long)]
    pub local_path: Option<PathBuf>,

    /// Installed version
    #[arg(long)]
    pub local_version: Option<String>,

    /// File carrying the version header
    #[arg(long)]
    pub main_file: Option<String>,

    /// Changelog file (default: CHANGES.md)
    #[arg(long)]
    pub changelog_file: Option<String>,
}

#[derive(Args)]
pub struct RemoveRepoCmd {
    /// Repo slug
    pub repo: String,
}

impl AddRepoCmd {
    fn to_entry(&self) -> Result<RepoEntry> {
        let Some((owner, repo)) = self.slug.split_once('/') else {
            anyhow::bail!("expected owner/repo, got '{}'", self.slug);
        };
        if owner.is_empty() || repo.is_empty() {
            anyhow::bail!("expected owner/repo, got '{}'", self.slug);
        }

        Ok(RepoEntry {
            host: self.host,
            owner: owner.to_string(),
            repo: repo.to_string(),
            artifact: self.artifact,
            branch: self.branch.clone(),
            default_branch: self.default_branch.clone(),
            enterprise: self.enterprise.clone(),
            enterprise_api: self.enterprise_api.clone(),
            local_path: self.local_path.clone(),
            local_path_extended: None,
            local_version: self.local_version.clone(),
            main_file: self.main_file.clone(),
            changelog_file: self.changelog_file.clone(),
        })
    }
}

impl ConfigCmd {
    pub async fn run(&self, config_path: &Path) -> Result<()> {
        match &self.command {
            ConfigSubCmd::SetToken(cmd) => {
                let mut config = LocalConfig::load_from(config_path)?;
                config.set_token(cmd.host, cmd.token.clone(), cmd.enterprise);
                config.save_to(config_path)?;
                let which = if cmd.enterprise { "Enterprise" } else { "Public" };
                println!("{} {} token saved.", which, cmd.host);
            }
            ConfigSubCmd::AddRepo(cmd) => {
                let entry = cmd.to_entry()?;
                let mut config = LocalConfig::load_from(config_path)?;
                println!("Tracking {}/{} on {}", entry.owner, entry.repo, entry.host);
                config.upsert_repo(entry);
                config.save_to(config_path)?;
            }
            ConfigSubCmd::RemoveRepo(cmd) => {
                let mut config = LocalConfig::load_from(config_path)?;
                let before = config.repos.len();
                config.repos.retain(|r| r.repo != cmd.repo);
                if config.repos.len() == before {
                    println!("'{}' is not tracked.", cmd.repo);
                } else {
                    config.save_to(config_path)?;
                    println!("Removed {}.", cmd.repo);
                }
            }
            ConfigSubCmd::Show => {
                let config = LocalConfig::load_from(config_path)?;
                println!("Config: {}", config_path.display());
                println!();
                for host in [Host::Gitlab, Host::Github] {
                    let tokens = config.tokens(host);
                    println!(
                        "{:<8} public: {}  enterprise: {}",
                        host,
                        token_state(&tokens.public_token),
                        token_state(&tokens.enterprise_token)
                    );
                }
                println!("cache_hours: {}", config.cache_hours);
                println!("concurrency: {}", config.concurrency);
                println!();
                if config.repos.is_empty() {
                    println!("No repos tracked.");
                }
                for entry in &config.repos {
                    let repo = entry.to_descriptor();
                    println!(
                        "{:<24} {} {} {} [{}]",
                        repo.repo,
                        repo.host,
                        repo.artifact,
                        repo.full_name(),
                        repo.branch()
                    );
                }
            }
        }
        Ok(())
    }
}

fn token_state(token: &Option<String>) -> &'static str {
    match token.as_deref() {
        Some(t) if !t.is_empty() => "(set)",
        _ => "(not set)",
    }
}
