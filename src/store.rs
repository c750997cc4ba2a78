use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Collection};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Capability for mindmap document persistence.
///
/// Three operations only: documents are created and read, never mutated or
/// deleted. Identity is the generated `_id`, rendered as an ObjectId hex
/// string in every response.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert `body` under a freshly generated id; returns `{_id, ...body}`.
    async fn insert(&self, body: Map<String, Value>) -> ServerResult<Value>;

    /// Fetch one document by its id string.
    ///
    /// Fails with `InvalidIdentifier` when `id` is not a valid ObjectId and
    /// `NotFound` when no document matches.
    async fn fetch(&self, id: &str) -> ServerResult<Value>;

    /// Every document in the collection, store-default order.
    async fn list(&self) -> ServerResult<Vec<Value>>;
}

/// Build the configured store backend.
pub async fn from_config(config: &ServerConfig) -> ServerResult<Arc<dyn DocumentStore>> {
    match config.store_backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        _ => Ok(Arc::new(MongoStore::connect(config).await?)),
    }
}

fn parse_object_id(id: &str) -> ServerResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|err| ServerError::InvalidIdentifier(format!("{id} ({err})")))
}

/// MongoDB-backed store.
///
/// One client is created at startup and shared across requests; the driver
/// pools connections internally, so per-request acquire/release is its
/// contract rather than per-handler bookkeeping.
pub struct MongoStore {
    client: Client,
    database: String,
    collection: String,
}

impl MongoStore {
    pub async fn connect(config: &ServerConfig) -> ServerResult<Self> {
        let client = Client::with_uri_str(&config.mongodb_uri).await?;
        tracing::info!(
            uri = %config.mongodb_uri,
            database = %config.mongodb_database,
            "Connected document store"
        );
        Ok(Self {
            client,
            database: config.mongodb_database.clone(),
            collection: config.mongodb_collection.clone(),
        })
    }

    fn collection(&self) -> Collection<Document> {
        self.client
            .database(&self.database)
            .collection(&self.collection)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert(&self, body: Map<String, Value>) -> ServerResult<Value> {
        let mut document = mongodb::bson::to_document(&body)
            .map_err(|err| ServerError::Internal(format!("BSON conversion failed: {err}")))?;
        let id = ObjectId::new();
        document.insert("_id", id);

        self.collection().insert_one(document.clone(), None).await?;
        Ok(document_to_json(document))
    }

    async fn fetch(&self, id: &str) -> ServerResult<Value> {
        let oid = parse_object_id(id)?;
        match self.collection().find_one(doc! { "_id": oid }, None).await? {
            Some(document) => Ok(document_to_json(document)),
            None => Err(ServerError::NotFound),
        }
    }

    async fn list(&self) -> ServerResult<Vec<Value>> {
        let cursor = self.collection().find(None, None).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(document_to_json).collect())
    }
}

/// Render a stored document as response JSON, with `_id` as a hex string
/// rather than extended-JSON `{"$oid": ...}`.
fn document_to_json(mut document: Document) -> Value {
    let id = document.remove("_id");
    let mut map = match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    match id {
        Some(Bson::ObjectId(oid)) => {
            map.insert("_id".to_string(), Value::String(oid.to_hex()));
        }
        Some(other) => {
            map.insert("_id".to_string(), other.into_relaxed_extjson());
        }
        None => {}
    }
    Value::Object(map)
}

/// In-memory store keyed by ObjectId hex strings.
///
/// Used by the `memory` backend and in tests; id semantics match the Mongo
/// backend so malformed-id behavior is identical.
#[derive(Default)]
pub struct MemoryStore {
    documents: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, body: Map<String, Value>) -> ServerResult<Value> {
        let id = ObjectId::new().to_hex();
        let mut document = body;
        document.insert("_id".to_string(), Value::String(id.clone()));
        let document = Value::Object(document);
        self.documents.insert(id, document.clone());
        Ok(document)
    }

    async fn fetch(&self, id: &str) -> ServerResult<Value> {
        let oid = parse_object_id(id)?;
        self.documents
            .get(&oid.to_hex())
            .map(|entry| entry.value().clone())
            .ok_or(ServerError::NotFound)
    }

    async fn list(&self) -> ServerResult<Vec<Value>> {
        Ok(self
            .documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}
