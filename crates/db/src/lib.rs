//! Document store access for carzone.
//!
//! Routes never talk to a driver directly. They hold a [`Collection`] handle
//! whose operations go through the [`DocumentStore`] capability set, so the
//! same code runs against MongoDB in production and [`MemoryStore`] in tests.

use std::sync::Arc;

pub mod ack;
pub mod collection;
pub mod document;
pub mod error;
pub mod memory;
pub mod mongo;
pub mod query;
pub mod store;

pub use ack::{DeleteAck, InsertAck, UpdateAck};
pub use collection::{Collection, Find};
pub use document::{Document, DocumentId};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use mongo::{MongoOptions, MongoStore};
pub use query::{Clause, Filter, FindQuery, IndexSpec, Projection, Sort, SortDirection};
pub use store::DocumentStore;

/// Owned handle to the process-wide store connection.
///
/// Cloning is cheap; every clone shares the same backend. The handle is
/// created once during bootstrap and released with [`Database::shutdown`].
#[derive(Clone)]
pub struct Database {
    store: Arc<dyn DocumentStore>,
}

impl Database {
    /// Wrap an already constructed backend.
    pub fn from_store(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Connect to a MongoDB deployment.
    pub async fn mongodb(options: &MongoOptions) -> StoreResult<Self> {
        let store = MongoStore::connect(options).await?;
        Ok(Self::from_store(Arc::new(store)))
    }

    /// Fresh, empty in-memory store.
    pub fn memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    /// Name of the backend behind this handle, for logs.
    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn collection(&self, name: &str) -> Collection {
        Collection::new(self.store.clone(), name)
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.store.ping().await
    }

    pub async fn create_index(&self, index: &IndexSpec) -> StoreResult<String> {
        tracing::info!(
            target: "carzone-db",
            collection = %index.collection,
            field = %index.field,
            index = %index.name,
            "ensuring index"
        );
        self.store.create_index(index).await
    }

    pub async fn shutdown(&self) -> StoreResult<()> {
        tracing::info!(target: "carzone-db", backend = self.backend(), "closing store connection");
        self.store.shutdown().await
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("backend", &self.backend())
            .finish()
    }
}
