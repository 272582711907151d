use async_trait::async_trait;

use crate::ack::{DeleteAck, InsertAck, UpdateAck};
use crate::document::{Document, DocumentId};
use crate::error::StoreResult;
use crate::query::{FindQuery, IndexSpec};

/// Capability set every document store backend provides.
///
/// Each call is one self-contained store operation; implementations take no
/// locks across calls and give single-document atomicity at most.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Filter, then sort, then limit, then project.
    async fn find(&self, collection: &str, query: &FindQuery) -> StoreResult<Vec<Document>>;

    async fn find_one(&self, collection: &str, id: &DocumentId) -> StoreResult<Option<Document>>;

    /// Persist the document as given. An `_id` is assigned when absent.
    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<InsertAck>;

    /// Overwrite exactly the fields in `set` on the matching document.
    async fn update_one(
        &self,
        collection: &str,
        id: &DocumentId,
        set: Document,
    ) -> StoreResult<UpdateAck>;

    async fn delete_one(&self, collection: &str, id: &DocumentId) -> StoreResult<DeleteAck>;

    /// Create the index if missing; returns the index name.
    async fn create_index(&self, index: &IndexSpec) -> StoreResult<String>;

    async fn ping(&self) -> StoreResult<()>;

    async fn shutdown(&self) -> StoreResult<()>;
}
