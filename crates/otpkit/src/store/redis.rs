//! Redis-backed solution store.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{SolutionStore, StoreError};

/// Solutions in Redis under `SET EX`, removed with `DEL`
#[derive(Clone)]
pub struct RedisStore {
    /// Redis connection manager (auto-reconnecting)
    redis: ConnectionManager,
}

impl RedisStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    /// Connect to `url` with a connection manager (handles reconnection)
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let redis = ConnectionManager::new(client).await?;
        Ok(Self::new(redis))
    }
}

#[async_trait]
impl SolutionStore for RedisStore {
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        // SET EX rejects 0; a zero TTL means the entry is already gone
        if ttl_secs == 0 {
            let _: () = conn.del(key).await?;
            return Ok(());
        }
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.redis.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn invalidate(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
