//! Per-repo response cache.
//!
//! Every fetched fragment (tags, branches, readme, ...) is stored as JSON
//! under its own transient id:
//!
//! ```text
//! ghu-{sha256(host/owner/repo)[..16]}-{key}
//! ```
//!
//! Entries expire independently. Expired rows are not reaped on read; the
//! backing store is pruned separately.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::types::RepoDescriptor;

/// Default time-to-live for cached responses.
pub const DEFAULT_TTL_HOURS: i64 = 12;

/// Longest time-to-live accepted from config, one year.
pub const MAX_TTL_HOURS: i64 = 24 * 365;

/// Unix expiry for an entry written now, saturating instead of overflowing.
pub(super) fn expires_at(ttl: Duration) -> i64 {
    Utc::now()
        .checked_add_signed(ttl)
        .map_or(i64::MAX, |at| at.timestamp())
}

/// The fragments we cache per repo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Parsed header block of the main file.
    File,
    Tags,
    /// Branch names.
    Branches,
    /// Raw changelog file payload.
    Changes,
    /// Rendered changelog HTML.
    Changelog,
    Readme,
    Meta,
    Projects,
}

impl CacheKey {
    pub const ALL: [CacheKey; 8] = [
        CacheKey::File,
        CacheKey::Tags,
        CacheKey::Branches,
        CacheKey::Changes,
        CacheKey::Changelog,
        CacheKey::Readme,
        CacheKey::Meta,
        CacheKey::Projects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::File => "file",
            CacheKey::Tags => "tags",
            CacheKey::Branches => "branches",
            CacheKey::Changes => "changes",
            CacheKey::Changelog => "changelog",
            CacheKey::Readme => "readme",
            CacheKey::Meta => "meta",
            CacheKey::Projects => "projects",
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Backing key/value store with per-entry expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a live entry, `None` if missing or expired.
    async fn get_transient(&self, id: &str) -> Result<Option<Vec<u8>>>;

    /// Insert or replace an entry.
    async fn set_transient(&self, id: &str, bytes: &[u8], ttl: Duration) -> Result<()>;

    async fn delete_transient(&self, id: &str) -> Result<()>;
}

/// Process-local store.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (Vec<u8>, i64)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, live or expired.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get_transient(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        let now = Utc::now().timestamp();
        Ok(entries
            .get(id)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(bytes, _)| bytes.clone()))
    }

    async fn set_transient(&self, id: &str, bytes: &[u8], ttl: Duration) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        entries.insert(id.to_string(), (bytes.to_vec(), expires_at(ttl)));
        Ok(())
    }

    async fn delete_transient(&self, id: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        entries.remove(id);
        Ok(())
    }
}

/// Cache view bound to a single repo.
#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    repo_id: String,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, repo: &RepoDescriptor, ttl: Duration) -> Self {
        Self {
            store,
            repo_id: Self::repo_id(repo),
            ttl,
        }
    }

    /// Stable identity for a repo's cache entries.
    pub fn repo_id(repo: &RepoDescriptor) -> String {
        let digest = Sha256::digest(format!("{}/{}/{}", repo.host, repo.owner, repo.repo));
        format!("ghu-{}", &hex::encode(digest)[..16])
    }

    fn transient_id(&self, key: CacheKey) -> String {
        format!("{}-{}", self.repo_id, key)
    }

    /// Cached payload for `key`, `None` on miss or expiry.
    pub async fn get(&self, key: CacheKey) -> Option<Value> {
        let id = self.transient_id(key);
        let bytes = match self.store.get_transient(&id).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                warn!(id = %id, error = %e, "cache read failed");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                debug!(id = %id, "cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    /// Store `payload` under `key`, replacing any previous entry.
    pub async fn put(&self, key: CacheKey, payload: &Value) {
        let id = self.transient_id(key);
        let bytes = match serde_json::to_vec(payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(id = %id, error = %e, "failed to encode cache entry");
                return;
            }
        };
        if let Err(e) = self.store.set_transient(&id, &bytes, self.ttl).await {
            warn!(id = %id, error = %e, "cache write failed");
        }
    }

    /// Drop every entry for this repo.
    pub async fn clear(&self) {
        for key in CacheKey::ALL {
            let id = self.transient_id(key);
            if let Err(e) = self.store.delete_transient(&id).await {
                warn!(id = %id, error = %e, "cache delete failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArtifactType, Host};
    use serde_json::json;

    fn widget() -> RepoDescriptor {
        RepoDescriptor::new(Host::Gitlab, "acme", "widget", ArtifactType::Plugin)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone(), &widget(), Duration::hours(12));

        assert!(cache.get(CacheKey::Tags).await.is_none());

        cache.put(CacheKey::Tags, &json!([{"name": "1.0"}])).await;
        assert_eq!(cache.get(CacheKey::Tags).await, Some(json!([{"name": "1.0"}])));
        assert!(cache.get(CacheKey::Branches).await.is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_miss() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone(), &widget(), Duration::seconds(-1));

        cache.put(CacheKey::Meta, &json!({"id": 1})).await;
        assert!(cache.get(CacheKey::Meta).await.is_none());
        // Not reaped on read
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_repos_do_not_share_entries() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        let a = ResponseCache::new(store.clone(), &widget(), Duration::hours(1));
        let other = RepoDescriptor::new(Host::Gitlab, "acme", "gadget", ArtifactType::Plugin);
        let b = ResponseCache::new(store, &other, Duration::hours(1));

        a.put(CacheKey::Readme, &json!({"name": "Widget"})).await;
        assert!(b.get(CacheKey::Readme).await.is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone(), &widget(), Duration::hours(1));
        cache.put(CacheKey::Tags, &json!([])).await;
        cache.put(CacheKey::Meta, &json!({})).await;

        cache.clear().await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_huge_ttl_saturates() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone(), &widget(), Duration::milliseconds(i64::MAX));

        cache.put(CacheKey::Tags, &json!([{"name": "1.0"}])).await;
        assert_eq!(cache.get(CacheKey::Tags).await, Some(json!([{"name": "1.0"}])));
        assert_eq!(expires_at(Duration::milliseconds(i64::MAX)), i64::MAX);
    }

    #[test]
    fn test_repo_id_is_stable() {
        let id = ResponseCache::repo_id(&widget());
        assert!(id.starts_with("ghu-"));
        assert_eq!(id.len(), 4 + 16);
        assert_eq!(id, ResponseCache::repo_id(&widget()));

        let github = RepoDescriptor::new(Host::Github, "acme", "widget", ArtifactType::Plugin);
        assert_ne!(id, ResponseCache::repo_id(&github));
    }
}
