use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use crate::ack::{DeleteAck, InsertAck, UpdateAck};
use crate::document::{Document, DocumentId};
use crate::error::StoreResult;
use crate::query::{Filter, FindQuery, Projection, Sort, SortDirection};
use crate::store::DocumentStore;

/// Handle to one named collection.
#[derive(Clone)]
pub struct Collection {
    store: Arc<dyn DocumentStore>,
    name: Arc<str>,
}

impl Collection {
    pub(crate) fn new(store: Arc<dyn DocumentStore>, name: &str) -> Self {
        Self {
            store,
            name: Arc::from(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start a find. Refine with [`Find::sort`], [`Find::limit`] and
    /// [`Find::projection`], then `.await` it.
    pub fn find(&self, filter: Filter) -> Find<'_> {
        Find {
            collection: self,
            query: FindQuery::new(filter),
        }
    }

    pub async fn find_one(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        tracing::debug!(collection = %self.name, %id, "find_one");
        self.store.find_one(&self.name, id).await
    }

    pub async fn insert_one(&self, document: Document) -> StoreResult<InsertAck> {
        tracing::debug!(collection = %self.name, fields = document.len(), "insert_one");
        self.store.insert_one(&self.name, document).await
    }

    pub async fn update_one(&self, id: &DocumentId, set: Document) -> StoreResult<UpdateAck> {
        tracing::debug!(collection = %self.name, %id, "update_one");
        self.store.update_one(&self.name, id, set).await
    }

    pub async fn delete_one(&self, id: &DocumentId) -> StoreResult<DeleteAck> {
        tracing::debug!(collection = %self.name, %id, "delete_one");
        self.store.delete_one(&self.name, id).await
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("backend", &self.store.backend())
            .finish()
    }
}

/// Pending `find` on a collection.
#[must_use = "a find does nothing until awaited"]
pub struct Find<'a> {
    collection: &'a Collection,
    query: FindQuery,
}

impl Find<'_> {
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort = Some(Sort {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.query.projection = Some(projection);
        self
    }

    pub fn query(&self) -> &FindQuery {
        &self.query
    }
}

impl<'a> IntoFuture for Find<'a> {
    type Output = StoreResult<Vec<Document>>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            tracing::debug!(collection = %self.collection.name, query = ?self.query, "find");
            self.collection
                .store
                .find(&self.collection.name, &self.query)
                .await
        })
    }
}
