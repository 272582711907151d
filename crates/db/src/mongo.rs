//! MongoDB backend.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document as BsonDocument};
use mongodb::options::{
    ClientOptions, Credential, FindOptions, IndexOptions, ServerApi, ServerApiVersion,
};
use mongodb::{Client, IndexModel};
use serde_json::Value;

use crate::ack::{DeleteAck, InsertAck, UpdateAck};
use crate::document::{Document, DocumentId, ID_FIELD};
use crate::error::StoreResult;
use crate::query::{Clause, Filter, FindQuery, IndexSpec, Projection, Sort};
use crate::store::DocumentStore;

/// Connection parameters for [`MongoStore::connect`].
#[derive(Debug, Clone)]
pub struct MongoOptions {
    pub uri: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Pin Stable API v1 with strict mode and deprecation errors.
    pub stable_api: bool,
    pub app_name: String,
}

pub struct MongoStore {
    client: Client,
    database: mongodb::Database,
}

impl MongoStore {
    pub async fn connect(options: &MongoOptions) -> StoreResult<Self> {
        let mut client_options = ClientOptions::parse(&options.uri).await?;
        client_options.app_name = Some(options.app_name.clone());

        if options.stable_api {
            client_options.server_api = Some(
                ServerApi::builder()
                    .version(ServerApiVersion::V1)
                    .strict(true)
                    .deprecation_errors(true)
                    .build(),
            );
        }

        if let (Some(username), Some(password)) = (&options.username, &options.password) {
            client_options.credential = Some(
                Credential::builder()
                    .username(username.clone())
                    .password(password.clone())
                    .build(),
            );
        }

        let client = Client::with_options(client_options)?;
        let database = client.database(&options.database);

        tracing::info!(
            target: "carzone-db",
            database = %options.database,
            stable_api = options.stable_api,
            "mongodb client created"
        );

        Ok(Self { client, database })
    }

    fn collection(&self, name: &str) -> mongodb::Collection<BsonDocument> {
        self.database.collection::<BsonDocument>(name)
    }
}

fn id_filter(id: &DocumentId) -> BsonDocument {
    doc! { "_id": id.object_id() }
}

fn filter_document(filter: &Filter) -> StoreResult<BsonDocument> {
    let mut document = BsonDocument::new();
    for clause in filter.clauses() {
        match clause {
            Clause::Eq { field, value } => {
                document.insert(field.clone(), bson::to_bson(value)?);
            }
            Clause::ContainsIgnoreCase { field, text } => {
                document.insert(
                    field.clone(),
                    doc! { "$regex": regex::escape(text), "$options": "i" },
                );
            }
        }
    }
    Ok(document)
}

fn sort_document(sort: &Sort) -> BsonDocument {
    let mut document = BsonDocument::new();
    document.insert(sort.field.clone(), sort.direction.as_i32());
    document
}

fn projection_document(projection: &Projection) -> BsonDocument {
    let mut document = BsonDocument::new();
    for field in &projection.fields {
        document.insert(field.clone(), 1);
    }
    if !projection.include_id {
        document.insert(ID_FIELD, 0);
    }
    document
}

fn find_options(query: &FindQuery) -> FindOptions {
    let mut options = FindOptions::default();
    options.sort = query.sort.as_ref().map(sort_document);
    options.limit = query.limit.map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));
    options.projection = query.projection.as_ref().map(projection_document);
    options
}

/// BSON to JSON with ObjectIds rendered as plain hex strings.
fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Document(document) => Value::Object(into_json_document(document)),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

fn into_json_document(document: BsonDocument) -> Document {
    document
        .into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect()
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn find(&self, collection: &str, query: &FindQuery) -> StoreResult<Vec<Document>> {
        let handle = self.collection(collection);
        let find = handle
            .find(filter_document(&query.filter)?)
            .with_options(find_options(query));

        let documents: Vec<BsonDocument> = find.await?.try_collect().await?;
        Ok(documents.into_iter().map(into_json_document).collect())
    }

    async fn find_one(&self, collection: &str, id: &DocumentId) -> StoreResult<Option<Document>> {
        let found = self.collection(collection).find_one(id_filter(id)).await?;
        Ok(found.map(into_json_document))
    }

    async fn insert_one(&self, collection: &str, document: Document) -> StoreResult<InsertAck> {
        let document = bson::to_document(&document)?;
        let result = self.collection(collection).insert_one(document).await?;
        Ok(InsertAck {
            acknowledged: true,
            inserted_id: bson_to_json(result.inserted_id),
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        id: &DocumentId,
        set: Document,
    ) -> StoreResult<UpdateAck> {
        let update = doc! { "$set": bson::to_document(&set)? };
        let result = self
            .collection(collection)
            .update_one(id_filter(id), update)
            .await?;
        Ok(UpdateAck {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(result.upserted_id.is_some()),
            upserted_id: result.upserted_id.map(bson_to_json),
        })
    }

    async fn delete_one(&self, collection: &str, id: &DocumentId) -> StoreResult<DeleteAck> {
        let result = self.collection(collection).delete_one(id_filter(id)).await?;
        Ok(DeleteAck {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    async fn create_index(&self, index: &IndexSpec) -> StoreResult<String> {
        let mut keys = BsonDocument::new();
        keys.insert(index.field.clone(), index.direction.as_i32());
        let model = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().name(index.name.clone()).build())
            .build();
        let result = self.collection(&index.collection).create_index(model).await?;
        Ok(result.index_name)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        tracing::info!(target: "carzone-db", "pinged mongodb deployment");
        Ok(())
    }

    async fn shutdown(&self) -> StoreResult<()> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}
