#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{
    config::StoreBackend,
    dao::{
        query::QuerySpec,
        storage::{StorageError, StorageResult},
    },
    paging::PageCursor,
};

/// Raw documents of one page, before decoding into records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPage {
    /// Documents in query order, as JSON.
    pub documents: Vec<Value>,
    /// Token for the following page, `None` when the store returned the last one.
    pub next_cursor: Option<PageCursor>,
}

/// Abstraction over the document stores able to serve paged queries.
pub trait PageStore: Send + Sync {
    /// Fetch at most `limit` documents matching `query`, resuming after `after`.
    fn fetch_documents(
        &self,
        query: QuerySpec,
        limit: usize,
        after: Option<PageCursor>,
    ) -> BoxFuture<'static, StorageResult<RawPage>>;
    /// Check that the backend answers.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Rebuild the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Shared slot holding the page store currently in use, if any.
#[derive(Clone, Default)]
pub struct StoreHandle {
    slot: Arc<RwLock<Option<Arc<dyn PageStore>>>>,
}

impl StoreHandle {
    /// Create an empty handle (degraded until a store is installed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Current store, if one is installed.
    pub async fn current(&self) -> Option<Arc<dyn PageStore>> {
        self.slot.read().await.as_ref().cloned()
    }

    /// Current store, or [`StorageError::Degraded`].
    pub async fn require(&self) -> StorageResult<Arc<dyn PageStore>> {
        self.current().await.ok_or(StorageError::Degraded)
    }

    /// Install (or replace) the store.
    pub async fn install(&self, store: Arc<dyn PageStore>) {
        self.slot.write().await.replace(store);
    }

    /// Remove the installed store.
    pub async fn clear(&self) {
        self.slot.write().await.take();
    }
}

/// Connect to the configured backend using the environment for its settings.
pub async fn connect_from_env(backend: StoreBackend) -> StorageResult<Arc<dyn PageStore>> {
    match backend {
        StoreBackend::Memory => {
            let store = memory::MemoryPageStore::from_env().await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "mongo-store")]
        StoreBackend::Mongo => {
            let config = mongodb::MongoConfig::from_env().await?;
            let store = mongodb::MongoPageStore::connect(config).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongo-store"))]
        StoreBackend::Mongo => Err(StorageError::Unsupported { backend: "mongo" }),
        #[cfg(feature = "couch-store")]
        StoreBackend::Couch => {
            let config = couchdb::CouchConfig::from_env()?;
            let store = couchdb::CouchPageStore::connect(config).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "couch-store"))]
        StoreBackend::Couch => Err(StorageError::Unsupported { backend: "couch" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handle_starts_degraded_and_tracks_installs() {
        let handle = StoreHandle::new();
        assert!(handle.current().await.is_none());
        assert!(matches!(handle.require().await, Err(StorageError::Degraded)));

        handle
            .install(Arc::new(memory::MemoryPageStore::new()))
            .await;
        assert!(handle.require().await.is_ok());

        handle.clear().await;
        assert!(handle.current().await.is_none());
    }
}
