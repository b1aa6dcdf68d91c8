//! Check command - run an update-check cycle for tracked repos.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Args;
use futures::stream::{self, StreamExt};

use crate::local::LocalConfig;
use crate::remote::{CycleOptions, CycleReport, run_cycle};

use super::open_context;

#[derive(Args)]
pub struct CheckCmd {
    /// Only check this repo (slug)
    #[arg(long, short = 'r')]
    pub repo: Option<String>,

    /// Ignore cached responses
    #[arg(long)]
    pub refresh: bool,

    /// Fetch branches even when no update is pending
    #[arg(long)]
    pub branch_switch: bool,

    /// Number of repos to check concurrently (default: from config)
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,

    /// Print reports as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckCmd {
    pub async fn run(&self, config_path: &Path) -> Result<()> {
        let config = LocalConfig::load_from(config_path)?;

        let entries: Vec<_> = config
            .repos
            .iter()
            .filter(|r| self.repo.as_deref().is_none_or(|slug| r.repo == slug))
            .collect();

        if entries.is_empty() {
            match &self.repo {
                Some(slug) => bail!("'{}' is not tracked", slug),
                None => {
                    println!("No repos tracked. Add one with `gitup config add-repo`.");
                    return Ok(());
                }
            }
        }

        let options = CycleOptions {
            refresh_cache: self.refresh,
            branch_switch: self.branch_switch,
        };
        let ctx = open_context(&config, options).await?;

        let mut credentials = HashMap::new();
        for entry in &entries {
            credentials
                .entry(entry.host)
                .or_insert_with(|| Arc::new(config.credentials(entry.host)));
        }

        let concurrency = self.concurrency.unwrap_or(config.concurrency).max(1);

        let mut reports: Vec<CycleReport> = stream::iter(entries.into_iter().map(|entry| {
            let ctx = &ctx;
            let creds = Arc::clone(&credentials[&entry.host]);
            async move { run_cycle(entry.to_descriptor(), creds, ctx, None).await }
        }))
        .buffer_unordered(concurrency)
        .collect()
        .await;

        reports.sort_by(|a, b| a.repo.repo.cmp(&b.repo.repo));

        if self.json {
            for report in &mut reports {
                let repo = &mut report.repo;
                repo.download_link = repo.download_link.as_deref().map(redact);
                for link in repo.rollback.values_mut().chain(repo.branches.values_mut()) {
                    *link = redact(link);
                }
            }
            println!("{}", serde_json::to_string_pretty(&reports)?);
            return Ok(());
        }

        for report in &reports {
            print_report(report);
        }

        let updates = reports.iter().filter(|r| r.update_available).count();
        println!();
        println!("{} of {} repos have updates", updates, reports.len());

        Ok(())
    }
}

fn print_report(report: &CycleReport) {
    let repo = &report.repo;

    if let Some(notice) = &report.notice {
        println!("{:<24} ! {}", repo.repo, notice);
        return;
    }

    let local = repo.local_version.as_deref().unwrap_or("-");
    let remote = repo.remote_version.as_deref().unwrap_or("?");
    let status = if report.update_available {
        "update available"
    } else {
        "up to date"
    };
    println!("{:<24} {} -> {} ({})", repo.repo, local, remote, status);

    if report.update_available {
        if let Some(link) = &repo.download_link {
            println!("  download: {}", redact(link));
        }
    }
    if !report.failed.is_empty() {
        println!("  unavailable: {}", report.failed.join(", "));
    }
}

/// Hide token values in a URL before printing it.
pub(super) fn redact(url: &str) -> String {
    let Ok(mut parsed) = url::Url::parse(url) else {
        return url.to_string();
    };

    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| {
            let v = if k.ends_with("token") {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();

    if pairs.is_empty() {
        return parsed.to_string();
    }
    parsed.query_pairs_mut().clear().extend_pairs(pairs);
    parsed.to_string()
}
