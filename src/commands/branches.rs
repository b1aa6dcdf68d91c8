//! Branches command - list remote branches and their archive links.

use std::path::Path;

use anyhow::{Result, bail};
use clap::Args;

use crate::local::LocalConfig;
use crate::remote::{CycleOptions, run_cycle};

use super::check::redact;
use super::{open_context, tracked_repo};

#[derive(Args)]
pub struct BranchesCmd {
    /// Repo slug
    pub repo: String,

    /// Show links with tokens in place
    #[arg(long)]
    pub show_tokens: bool,
}

impl BranchesCmd {
    pub async fn run(&self, config_path: &Path) -> Result<()> {
        let config = LocalConfig::load_from(config_path)?;
        let entry = tracked_repo(&config, &self.repo)?;

        let options = CycleOptions {
            branch_switch: true,
            ..Default::default()
        };
        let ctx = open_context(&config, options).await?;

        let report = run_cycle(
            entry.to_descriptor(),
            config.credentials(entry.host).into(),
            &ctx,
            None,
        )
        .await;

        if let Some(notice) = report.notice {
            bail!(notice);
        }

        let repo = &report.repo;
        if repo.branches.is_empty() {
            println!("No branches found for {}.", repo.full_name());
            return Ok(());
        }

        let width = repo.branches.keys().map(String::len).max().unwrap_or(0);
        for (name, link) in &repo.branches {
            let marker = if name == repo.branch() { "*" } else { " " };
            let link = if self.show_tokens {
                link.clone()
            } else {
                redact(link)
            };
            println!("{} {:<width$}  {}", marker, name, link, width = width);
        }

        Ok(())
    }
}
