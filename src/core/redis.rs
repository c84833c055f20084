use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::{cmd, Client, RedisError};
use tokio::sync::RwLock;

/// Lazily connected Redis client shared between clones.
#[derive(Clone)]
pub struct RedisHandle {
    url: String,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
}

impl RedisHandle {
    pub fn new(url: String) -> Self {
        Self { url, manager: Arc::new(RwLock::new(None)) }
    }

    pub async fn connect(&self) -> Result<(), RedisError> {
        let client = Client::open(self.url.clone())?;
        let manager = ConnectionManager::new(client).await?;
        let mut guard = self.manager.write().await;
        *guard = Some(manager);
        Ok(())
    }

    pub async fn disconnect(&self) {
        let mut guard = self.manager.write().await;
        *guard = None;
    }

    pub async fn is_connected(&self) -> bool {
        self.manager.read().await.is_some()
    }

    /// `None` when the handle is disconnected.
    pub(crate) async fn get(&self, key: &str) -> Option<Result<Option<String>, RedisError>> {
        let mut manager = { self.manager.read().await.clone() }?;
        Some(cmd("GET").arg(key).query_async::<_, Option<String>>(&mut manager).await)
    }

    pub(crate) async fn set(&self, key: &str, value: &str) -> Option<Result<(), RedisError>> {
        let mut manager = { self.manager.read().await.clone() }?;
        Some(cmd("SET").arg(key).arg(value).query_async::<_, ()>(&mut manager).await)
    }

    pub(crate) async fn del(&self, key: &str) -> Option<Result<(), RedisError>> {
        let mut manager = { self.manager.read().await.clone() }?;
        Some(cmd("DEL").arg(key).query_async::<_, ()>(&mut manager).await)
    }
}

impl std::fmt::Debug for RedisHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisHandle").finish_non_exhaustive()
    }
}
