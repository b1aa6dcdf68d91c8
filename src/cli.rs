//! CLI argument definitions.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::commands::{BranchesCmd, CacheCmd, CheckCmd, ConfigCmd, LinkCmd};

#[derive(Parser)]
#[command(name = "gitup")]
#[command(about = "gitup - update checks for plugins and themes hosted on GitLab and GitHub")]
#[command(version)]
pub struct Cli {
    /// Config file (default: ~/.config/gitup/config.toml)
    #[arg(long, global = true, env = "GITUP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check tracked repos for new versions
    Check(CheckCmd),

    /// Print the download link for a repo
    Link(LinkCmd),

    /// List a repo's branches
    Branches(BranchesCmd),

    /// Manage configuration (tokens, tracked repos)
    Config(ConfigCmd),

    /// Manage the response cache
    Cache(CacheCmd),
}

impl Command {
    pub async fn execute(&self, config_path: &Path) -> anyhow::Result<()> {
        match self {
            Command::Check(cmd) => cmd.run(config_path).await,
            Command::Link(cmd) => cmd.run(config_path).await,
            Command::Branches(cmd) => cmd.run(config_path).await,
            Command::Config(cmd) => cmd.run(config_path).await,
            Command::Cache(cmd) => cmd.run(config_path).await,
        }
    }
}
