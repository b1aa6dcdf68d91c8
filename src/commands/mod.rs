//! CLI command implementations.

mod branches;
mod cache;
mod check;
mod config;
mod link;

pub use branches::BranchesCmd;
pub use cache::CacheCmd;
pub use check::CheckCmd;
pub use config::ConfigCmd;
pub use link::LinkCmd;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::warn;

use crate::local::{CacheStore, LocalConfig, MemoryStore, RepoEntry, SqliteStore};
use crate::remote::{ApiContext, CycleOptions, ReqwestTransport};

/// Open the response cache and HTTP transport for a run.
async fn open_context(config: &LocalConfig, options: CycleOptions) -> Result<ApiContext> {
    let store: Arc<dyn CacheStore> = match SqliteStore::open(&LocalConfig::cache_path()?).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            let reason = format!("{:#}", e);
            warn!(error = %reason, "cache unavailable, responses kept in memory");
            Arc::new(MemoryStore::new())
        }
    };
    let transport = ReqwestTransport::new().context("Failed to build HTTP client")?;

    Ok(ApiContext {
        transport: Arc::new(transport),
        store,
        ttl: config.cache_ttl(),
        options,
    })
}

fn tracked_repo<'a>(config: &'a LocalConfig, slug: &str) -> Result<&'a RepoEntry> {
    config
        .find_repo(slug)
        .with_context(|| format!("'{}' is not tracked. Run `gitup config add-repo` first.", slug))
}
