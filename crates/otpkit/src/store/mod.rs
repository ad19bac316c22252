//! Solution storage.
//!
//! The engine only needs three per-key operations with a TTL. Each call is
//! assumed atomic for its key; nothing here is atomic across keys.

mod memory;
mod redis;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

use async_trait::async_trait;
use thiserror::Error;

/// Storage failure. The engine maps every variant to `STORAGE_FAILURE`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Key/value capability with time-to-live
#[async_trait]
pub trait SolutionStore: Send + Sync {
    /// Store `value` under `key` for `ttl_secs` seconds
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), StoreError>;

    /// `None` when the key does not exist (or has expired)
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Remove `key`; removing a missing key is not an error
    async fn invalidate(&self, key: &str) -> Result<(), StoreError>;

    /// Connectivity probe for readiness checks
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
