//! Link command - print the archive URL an update would install.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Args;

use crate::local::LocalConfig;
use crate::remote::{CycleOptions, GitHosts, download_link, rollback_link, run_cycle};
use crate::types::RollbackRequest;

use super::{open_context, tracked_repo};

#[derive(Args)]
pub struct LinkCmd {
    /// Repo slug
    pub repo: String,

    /// Tag to roll back to instead of the newest release
    #[arg(long)]
    pub rollback: Option<String>,

    /// Install from this branch instead
    #[arg(long, conflicts_with = "rollback")]
    pub branch: Option<String>,
}

impl LinkCmd {
    pub async fn run(&self, config_path: &Path) -> Result<()> {
        let config = LocalConfig::load_from(config_path)?;
        let entry = tracked_repo(&config, &self.repo)?;

        let options = CycleOptions {
            branch_switch: self.branch.is_some(),
            ..Default::default()
        };
        let ctx = open_context(&config, options).await?;
        let credentials = Arc::new(config.credentials(entry.host));

        let rollback = self.rollback.as_ref().map(|version| RollbackRequest {
            repo: entry.repo.clone(),
            version: version.clone(),
        });

        let report = run_cycle(
            entry.to_descriptor(),
            Arc::clone(&credentials),
            &ctx,
            rollback.as_ref(),
        )
        .await;

        if let Some(notice) = report.notice {
            bail!(notice);
        }

        let repo = &report.repo;
        if let Some(version) = &self.rollback {
            if !repo.tags.is_empty() && !repo.rollback.contains_key(version) {
                eprintln!("warning: {} has no tag '{}'", repo.repo, version);
            }
        }

        let host = GitHosts::new(repo.host);
        let link = match (&self.rollback, &self.branch) {
            (Some(version), _) => rollback_link(&host, repo, &credentials, version),
            (None, Some(branch)) => download_link(&host, repo, &credentials, None, Some(branch)),
            (None, None) => match &repo.download_link {
                Some(link) => link.clone(),
                None => bail!(
                    "could not resolve {} (unavailable: {})",
                    repo.full_name(),
                    report.failed.join(", ")
                ),
            },
        };

        println!("{}", link);
        Ok(())
    }
}
