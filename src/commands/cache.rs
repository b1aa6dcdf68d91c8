//! Cache command - inspect and clear cached provider responses.

use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::local::{LocalConfig, SqliteStore};

#[derive(Args)]
pub struct CacheCmd {
    #[command(subcommand)]
    pub command: CacheSubCmd,
}

#[derive(Subcommand)]
pub enum CacheSubCmd {
    /// Delete every cached response
    Clear,

    /// Delete expired responses only
    Prune,

    /// Show cache location and entry counts
    Status,
}

impl CacheCmd {
    pub async fn run(&self, _config_path: &Path) -> Result<()> {
        let path = LocalConfig::cache_path()?;
        let store = SqliteStore::open(&path).await?;

        match &self.command {
            CacheSubCmd::Clear => {
                let removed = store.clear().await?;
                println!("Removed {} cached responses.", removed);
            }
            CacheSubCmd::Prune => {
                let removed = store.purge_expired().await?;
                println!("Removed {} expired responses.", removed);
            }
            CacheSubCmd::Status => {
                let (live, expired) = store.counts().await?;
                println!("Cache: {}", path.display());
                println!();
                println!("live:       {}", live);
                println!("expired:    {}", expired);
            }
        }

        Ok(())
    }
}
