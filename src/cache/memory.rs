// src/cache/memory.rs

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use tokio::time::Instant;

use super::{CacheError, DraftCache};

/// In-process draft cache used when no Redis is configured.
#[derive(Debug, Clone, Default)]
pub struct MemoryDraftCache {
    entries: Arc<Mutex<HashMap<String, (String, Instant)>>>,
}

impl MemoryDraftCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftCache for MemoryDraftCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CacheError::Backend(e.to_string()))?;
        // Expired drafts are purged on write so abandoned keys do not pile up
        let now = Instant::now();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| CacheError::Backend(e.to_string()))?;

        let live = entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone());

        if live.is_none() {
            entries.remove(key);
        }
        Ok(live)
    }
}
