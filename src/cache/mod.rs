// src/cache/mod.rs

//! Key-value cache for in-progress quiz drafts.

mod memory;
mod redis;

pub use self::memory::MemoryDraftCache;
pub use self::redis::RedisDraftCache;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("cache backend error: {0}")]
    Backend(String),
}

/// A string cache with per-entry expiry.
#[async_trait]
pub trait DraftCache: Send + Sync + 'static {
    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Read the live value under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
}

/// Builds the draft cache for the configured backend.
///
/// With a Redis URL the cache is Redis or an error, never a silent local
/// substitute. Without one, drafts live in process memory.
pub async fn connect_draft_cache(
    redis_url: Option<&str>,
) -> Result<Arc<dyn DraftCache>, CacheError> {
    match redis_url {
        Some(url) => {
            let cache = RedisDraftCache::connect(url).await?;
            tracing::info!("Redis connected...");
            Ok(Arc::new(cache))
        }
        None => {
            tracing::warn!("REDIS_URL not set, drafts are kept in process memory");
            Ok(Arc::new(MemoryDraftCache::new()))
        }
    }
}
