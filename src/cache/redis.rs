// src/cache/redis.rs

use std::time::Duration;

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

use super::{CacheError, DraftCache};

/// Upper bound for establishing a connection to Redis.
const CONNECTION_TIMEOUT: Duration = Duration::from_millis(500);

/// Upper bound for a single command; an autosave never waits longer.
const RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Draft cache over a shared, auto-reconnecting Redis connection.
///
/// Once connected, a Redis outage surfaces per request as a [`CacheError`]
/// while the manager keeps reconnecting in the background.
#[derive(Clone)]
pub struct RedisDraftCache {
    connection: ConnectionManager,
}

impl RedisDraftCache {
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(CONNECTION_TIMEOUT)
            .set_response_timeout(RESPONSE_TIMEOUT);

        let client = Client::open(redis_url)?;
        let connection = client.get_connection_manager_with_config(config).await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl DraftCache for RedisDraftCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }
}
