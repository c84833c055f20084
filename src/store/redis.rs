use async_trait::async_trait;

use super::{DraftStore, StoreError};
use crate::core::redis::RedisHandle;

#[derive(Debug, Clone)]
pub struct RedisStore {
    handle: RedisHandle,
}

impl RedisStore {
    pub fn new(handle: RedisHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &RedisHandle {
        &self.handle
    }
}

#[async_trait]
impl DraftStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let result = self.handle.get(key).await.ok_or(StoreError::Disconnected)?;
        Ok(result?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let result = self.handle.set(key, value).await.ok_or(StoreError::Disconnected)?;
        Ok(result?)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let result = self.handle.del(key).await.ok_or(StoreError::Disconnected)?;
        Ok(result?)
    }
}
