//! In-process document store.
//!
//! Mirrors the MongoDB semantics the service relies on: insertion order as
//! natural order, null-or-missing equality, case-insensitive pattern search,
//! mixed-type sort order, and "modified" counts that ignore no-op writes.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::ack::{DeleteAck, InsertAck, UpdateAck};
use crate::document::{Document, DocumentId, ID_FIELD};
use crate::error::{StoreError, StoreResult};
use crate::query::{Clause, FindQuery, IndexSpec, Projection, Sort, SortDirection};
use crate::store::DocumentStore;

/// A document plus the ObjectId the store generated for it. Client-supplied
/// `_id` values stay plain JSON and never match an identifier lookup.
struct StoredDocument {
    object_id: Option<DocumentId>,
    document: Document,
}

#[derive(Default)]
struct MemoryCollection {
    documents: Vec<StoredDocument>,
    indexes: BTreeSet<String>,
}

/// Store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index names declared on a collection.
    pub async fn index_names(&self, collection: &str) -> Vec<String> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.indexes.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(AtomicOrdering::Acquire) {
            return Err(StoreError::Unavailable(
                "memory store has been shut down".to_string(),
            ));
        }
        Ok(())
    }
}

/// Clause with its pattern compiled once per query.
enum Matcher<'q> {
    Eq(&'q str, &'q Value),
    Pattern(&'q str, Regex),
}

impl<'q> Matcher<'q> {
    fn compile(clause: &'q Clause) -> StoreResult<Self> {
        match clause {
            Clause::Eq { field, value } => Ok(Self::Eq(field, value)),
            Clause::ContainsIgnoreCase { field, text } => {
                let regex = RegexBuilder::new(&regex::escape(text))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                Ok(Self::Pattern(field, regex))
            }
        }
    }

    fn matches(&self, document: &Document) -> bool {
        match self {
            Self::Eq(field, Value::Null) => matches!(document.get(*field), None | Some(Value::Null)),
            Self::Eq(field, expected) => document.get(*field) == Some(*expected),
            Self::Pattern(field, regex) => document
                .get(*field)
                .and_then(Value::as_str)
                .is_some_and(|text| regex.is_match(text)),
        }
    }
}

/// Cross-type ordering rank: missing/null, numbers, strings, objects, arrays, booleans.
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn compare_values(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

fn sort_documents(documents: &mut [Document], sort: &Sort) {
    documents.sort_by(|a, b| {
        let ordering = compare_values(a.get(&sort.field), b.get(&sort.field));
        match sort.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

fn project(document: &Document, projection: &Projection) -> Document {
    let mut projected = Document::new();
    if projection.include_id {
        if let Some(id) = document.get(ID_FIELD) {
            projected.insert(ID_FIELD.to_string(), id.clone());
        }
    }
    for field in &projection.fields {
        if let Some(value) = document.get(field) {
            projected.insert(field.clone(), value.clone());
        }
    }
    projected
}

fn has_id(stored: &StoredDocument, id: &DocumentId) -> bool {
    stored.object_id.as_ref() == Some(id)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find(&self, collection: &str, query: &FindQuery) -> StoreResult<Vec<Document>> {
        self.ensure_open()?;
        let matchers = query
            .filter
            .clauses()
            .iter()
            .map(Matcher::compile)
            .collect::<StoreResult<Vec<_>>>()?;

        let collections = self.collections.read().await;
        let mut documents: Vec<Document> = collections
            .get(collection)
            .map(|c| {
                c.documents
                    .iter()
                    .map(|stored| &stored.document)
                    .filter(|doc| matchers.iter().all(|m| m.matches(doc)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(collections);

        if let Some(sort) = &query.sort {
            sort_documents(&mut documents, sort);
        }
        // Zero means unbounded, as with the driver.
        if let Some(limit) = query.limit.filter(|&limit| limit > 0) {
            documents.truncate(limit);
        }
        if let Some(projection) = &query.projection {
            documents = documents.iter().map(|doc| project(doc, projection)).collect();
        }
        Ok(documents)
    }

    async fn find_one(&self, collection: &str, id: &DocumentId) -> StoreResult<Option<Document>> {
        self.ensure_open()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.documents.iter().find(|stored| has_id(stored, id)))
            .map(|stored| stored.document.clone()))
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> StoreResult<InsertAck> {
        self.ensure_open()?;
        let object_id = if document.contains_key(ID_FIELD) {
            None
        } else {
            let id = DocumentId::generate();
            document.insert(ID_FIELD.to_string(), id.into());
            Some(id)
        };
        let inserted_id = document.get(ID_FIELD).cloned().unwrap_or(Value::Null);

        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.to_string()).or_default();
        if target.documents.iter().any(|stored| {
            stored.object_id == object_id && stored.document.get(ID_FIELD) == Some(&inserted_id)
        }) {
            return Err(StoreError::Backend(format!(
                "duplicate key error collection: {collection} _id: {inserted_id}"
            )));
        }
        target.documents.push(StoredDocument {
            object_id,
            document,
        });

        Ok(InsertAck {
            acknowledged: true,
            inserted_id,
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        id: &DocumentId,
        set: Document,
    ) -> StoreResult<UpdateAck> {
        self.ensure_open()?;
        let mut collections = self.collections.write().await;
        let Some(stored) = collections
            .get_mut(collection)
            .and_then(|c| c.documents.iter_mut().find(|stored| has_id(stored, id)))
        else {
            return Ok(UpdateAck {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
                upserted_count: 0,
                upserted_id: None,
            });
        };

        let mut modified = false;
        for (field, value) in set {
            if stored.document.get(&field) != Some(&value) {
                stored.document.insert(field, value);
                modified = true;
            }
        }

        Ok(UpdateAck {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(modified),
            upserted_count: 0,
            upserted_id: None,
        })
    }

    async fn delete_one(&self, collection: &str, id: &DocumentId) -> StoreResult<DeleteAck> {
        self.ensure_open()?;
        let mut collections = self.collections.write().await;
        let deleted = collections
            .get_mut(collection)
            .and_then(|c| {
                let position = c.documents.iter().position(|stored| has_id(stored, id))?;
                Some(c.documents.remove(position))
            })
            .is_some();

        Ok(DeleteAck {
            acknowledged: true,
            deleted_count: u64::from(deleted),
        })
    }

    async fn create_index(&self, index: &IndexSpec) -> StoreResult<String> {
        self.ensure_open()?;
        let mut collections = self.collections.write().await;
        collections
            .entry(index.collection.clone())
            .or_default()
            .indexes
            .insert(index.name.clone());
        Ok(index.name.clone())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.ensure_open()
    }

    async fn shutdown(&self) -> StoreResult<()> {
        self.closed.store(true, AtomicOrdering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Filter;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        for car in [
            json!({"name": "Red Racer", "subcategory": "sports car", "sellerEmail": "a@x.com", "price": 10}),
            json!({"name": "Blue Truck", "subcategory": "truck", "sellerEmail": "a@x.com", "price": 25.5}),
            json!({"name": "Green racer", "subcategory": "sports car", "sellerEmail": "b@x.com", "price": 5}),
            json!({"name": "Ownerless", "subcategory": "truck", "price": 7}),
        ] {
            store.insert_one("cars", doc(car)).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn insert_assigns_hex_identifier() {
        let store = MemoryStore::new();
        let ack = store
            .insert_one("cars", doc(json!({"name": "Mini"})))
            .await
            .unwrap();
        assert!(ack.acknowledged);
        let id: DocumentId = ack.inserted_id.as_str().unwrap().parse().unwrap();
        let found = store.find_one("cars", &id).await.unwrap().unwrap();
        assert_eq!(found.get("name"), Some(&json!("Mini")));
    }

    #[tokio::test]
    async fn duplicate_identifier_is_rejected() {
        let store = MemoryStore::new();
        let id = DocumentId::generate();
        let body = doc(json!({"_id": id.to_hex()}));
        store.insert_one("cars", body.clone()).await.unwrap();
        assert!(matches!(
            store.insert_one("cars", body).await,
            Err(StoreError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn equality_filter() {
        let store = seeded().await;
        let found = store
            .find("cars", &FindQuery::new(Filter::eq("subcategory", "sports car")))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn null_equality_matches_missing_field() {
        let store = seeded().await;
        let found = store
            .find("cars", &FindQuery::new(Filter::eq("sellerEmail", Value::Null)))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("name"), Some(&json!("Ownerless")));
    }

    #[tokio::test]
    async fn contains_is_case_insensitive_and_literal() {
        let store = seeded().await;
        let found = store
            .find("cars", &FindQuery::new(Filter::contains_ignore_case("name", "RACER")))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let none = store
            .find("cars", &FindQuery::new(Filter::contains_ignore_case("name", "r.cer")))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn sort_and_limit() {
        let store = seeded().await;
        let mut query = FindQuery::new(Filter::all());
        query.sort = Some(Sort {
            field: "price".into(),
            direction: SortDirection::Descending,
        });
        query.limit = Some(2);
        let found = store.find("cars", &query).await.unwrap();
        let prices: Vec<_> = found.iter().map(|d| d["price"].as_f64().unwrap()).collect();
        assert_eq!(prices, vec![25.5, 10.0]);
    }

    #[tokio::test]
    async fn missing_sort_field_orders_first_ascending() {
        let store = seeded().await;
        store
            .insert_one("cars", doc(json!({"name": "No price"})))
            .await
            .unwrap();
        let mut query = FindQuery::new(Filter::all());
        query.sort = Some(Sort {
            field: "price".into(),
            direction: SortDirection::Ascending,
        });
        let found = store.find("cars", &query).await.unwrap();
        assert_eq!(found[0].get("name"), Some(&json!("No price")));
    }

    #[tokio::test]
    async fn projection_keeps_only_listed_fields() {
        let store = seeded().await;
        let mut query = FindQuery::new(Filter::all());
        query.projection = Some(Projection::only(["name"]));
        let found = store.find("cars", &query).await.unwrap();
        assert!(found.iter().all(|d| d.len() == 1 && d.contains_key("name")));
    }

    #[tokio::test]
    async fn update_reports_matched_and_modified() {
        let store = seeded().await;
        let ack = store
            .insert_one("cars", doc(json!({"name": "Target", "price": 1})))
            .await
            .unwrap();
        let id: DocumentId = ack.inserted_id.as_str().unwrap().parse().unwrap();

        let set = doc(json!({"price": 2}));
        let first = store.update_one("cars", &id, set.clone()).await.unwrap();
        assert_eq!((first.matched_count, first.modified_count), (1, 1));

        let second = store.update_one("cars", &id, set).await.unwrap();
        assert_eq!((second.matched_count, second.modified_count), (1, 0));

        let missing = store
            .update_one("cars", &DocumentId::generate(), doc(json!({"price": 3})))
            .await
            .unwrap();
        assert_eq!(missing.matched_count, 0);
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let store = seeded().await;
        let ack = store
            .insert_one("cars", doc(json!({"name": "Doomed"})))
            .await
            .unwrap();
        let id: DocumentId = ack.inserted_id.as_str().unwrap().parse().unwrap();

        assert_eq!(store.delete_one("cars", &id).await.unwrap().deleted_count, 1);
        assert_eq!(store.delete_one("cars", &id).await.unwrap().deleted_count, 0);
        assert!(store.find_one("cars", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_index_is_idempotent() {
        let store = MemoryStore::new();
        let spec = IndexSpec::ascending("cars", "name", "toyCarsName");
        store.create_index(&spec).await.unwrap();
        store.create_index(&spec).await.unwrap();
        assert_eq!(store.index_names("cars").await, vec!["toyCarsName".to_string()]);
    }

    #[tokio::test]
    async fn shutdown_makes_store_unavailable() {
        let store = MemoryStore::new();
        store.ping().await.unwrap();
        store.shutdown().await.unwrap();
        assert!(matches!(store.ping().await, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn zero_limit_is_unbounded() {
        let store = seeded().await;
        let all = store.find("cars", &FindQuery::default()).await.unwrap();
        let query = FindQuery {
            limit: Some(0),
            ..FindQuery::default()
        };
        let unbounded = store.find("cars", &query).await.unwrap();
        assert!(!all.is_empty());
        assert_eq!(unbounded.len(), all.len());
    }

    #[tokio::test]
    async fn client_supplied_string_id_is_not_an_object_id() {
        let store = MemoryStore::new();
        let raw = "64b7f0c2a1b2c3d4e5f60718";
        let ack = store
            .insert_one("cars", doc(json!({"_id": raw, "name": "x"})))
            .await
            .unwrap();
        assert_eq!(ack.inserted_id, json!(raw));

        let id: DocumentId = raw.parse().unwrap();
        assert!(store.find_one("cars", &id).await.unwrap().is_none());
        let update = store
            .update_one("cars", &id, doc(json!({"price": 1})))
            .await
            .unwrap();
        assert_eq!(update.matched_count, 0);
        assert_eq!(store.delete_one("cars", &id).await.unwrap().deleted_count, 0);

        let listed = store
            .find("cars", &FindQuery::new(Filter::eq("name", "x")))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
    }
}
