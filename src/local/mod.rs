//! Local state: configuration, the response cache and bundled files.
//!
//! - `~/.config/gitup/config.toml` - tokens and tracked repos
//! - `~/.cache/gitup/cache.sqlite` - cached provider responses

pub mod cache;
mod config;
mod db;
pub mod files;

pub use cache::{CacheKey, CacheStore, MemoryStore, ResponseCache};
pub use config::{Credentials, LocalConfig, RepoEntry};
pub use db::SqliteStore;
