//! Key-value storage for draft snapshots.
//!
//! The wizard only ever needs three operations on a single string slot, so every backend
//! implements [`DraftStore`] and the rest of the crate holds an `Arc<dyn DraftStore>`.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::config::{Settings, StoreBackend};
use crate::core::redis::RedisHandle;

mod file;
mod memory;
mod redis;
mod slot;

pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;
pub use self::slot::{DraftSlot, SaveTrigger};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("draft store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("redis command failed: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("draft store is not connected")]
    Disconnected,
    #[error("failed to encode draft snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrites any previous value under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

pub async fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn DraftStore>> {
    let store: Arc<dyn DraftStore> = match settings.store().backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory draft store; drafts will not survive a restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::File => {
            let store = FileStore::new(settings.store().data_dir.clone());
            store.ensure_dir().await?;
            tracing::info!(dir = %settings.store().data_dir.display(), "File draft store ready");
            Arc::new(store)
        }
        StoreBackend::Redis => {
            let handle = RedisHandle::new(settings.redis().redis_url());
            if let Err(err) = handle.connect().await {
                tracing::error!(
                    error = %err,
                    "Failed to connect to Redis; drafts will not be saved"
                );
            } else {
                tracing::info!("Redis connected successfully");
            }
            Arc::new(RedisStore::new(handle))
        }
    };

    Ok(store)
}
