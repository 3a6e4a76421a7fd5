//! MongoDB storage backend using the official MongoDB async driver.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! coursehub = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! One collection per entity type, named by [`EntityType::collection`]
//! (`courses`, `userroles`, ...).
//!
//! # Identifier handling
//!
//! Ids and references are stored as native `ObjectId`s. On the way out they
//! are rendered as their 24-character hex string; on the way in (filters,
//! inserted documents) any 24-character hex string is turned back into an
//! `ObjectId`. This keeps ids read by one cascade step usable as filter
//! values in the next one.

use crate::core::entity::{Document as JsonDocument, EntityType, ID_FIELD};
use crate::core::error::StorageError;
use crate::core::filter::{Clause, Filter, Operator};
use crate::core::store::DocumentStore;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document, doc};
use mongodb::{Client, Database};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

fn is_object_id(s: &str) -> bool {
    s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Convert a JSON value to BSON, turning hex id strings into `ObjectId`s.
fn json_to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Bson::Int64(i),
            None => Bson::Double(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) if is_object_id(s) => match ObjectId::parse_str(s) {
            Ok(oid) => Bson::ObjectId(oid),
            Err(_) => Bson::String(s.clone()),
        },
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(items) => Bson::Array(items.iter().map(json_to_bson).collect()),
        Value::Object(map) => Bson::Document(map_to_document(map)),
    }
}

fn map_to_document(map: &Map<String, Value>) -> Document {
    map.iter()
        .map(|(key, value)| (key.clone(), json_to_bson(value)))
        .collect()
}

/// Convert a JSON value (expected to be an Object) into a BSON Document.
fn json_to_document(json: &Value) -> Result<Document> {
    match json {
        Value::Object(map) => Ok(map_to_document(map)),
        _ => Err(anyhow!("Expected BSON document, got non-object")),
    }
}

/// Convert BSON back to JSON, rendering `ObjectId`s as hex strings.
fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Document(doc) => Value::Object(document_to_map(doc)),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

fn document_to_map(doc: Document) -> JsonDocument {
    doc.into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect()
}

fn single(key: &str, value: impl Into<Bson>) -> Document {
    let mut doc = Document::new();
    doc.insert(key, value);
    doc
}

/// Translate a [`Filter`] into a MongoDB query document.
fn filter_to_document(filter: &Filter) -> Document {
    match filter {
        Filter::Clause(Clause { field, op, value }) => match op {
            Operator::Equals => single(field, json_to_bson(value)),
            Operator::In => {
                let values: Vec<Bson> = match value {
                    Value::Array(items) => items.iter().map(json_to_bson).collect(),
                    other => vec![json_to_bson(other)],
                };
                single(field, doc! { "$in": values })
            }
        },
        // MongoDB rejects an empty $or; an empty $in never matches.
        Filter::Or(filters) if filters.is_empty() => {
            single(ID_FIELD, doc! { "$in": Vec::<Bson>::new() })
        }
        Filter::Or(filters) => {
            let branches: Vec<Document> = filters.iter().map(filter_to_document).collect();
            doc! { "$or": branches }
        }
        Filter::And(filters) if filters.is_empty() => doc! {},
        Filter::And(filters) => {
            let branches: Vec<Document> = filters.iter().map(filter_to_document).collect();
            doc! { "$and": branches }
        }
    }
}

fn projection_document(fields: &[&str]) -> Document {
    let mut projection = single(ID_FIELD, 1);
    for field in fields {
        projection.insert(*field, 1);
    }
    projection
}

// ---------------------------------------------------------------------------
// MongoDocumentStore
// ---------------------------------------------------------------------------

/// MongoDB-backed [`DocumentStore`]
///
/// # Example
///
/// ```rust,ignore
/// use coursehub::storage::MongoDocumentStore;
///
/// let store = MongoDocumentStore::from_uri("mongodb://localhost:27017", "coursehub").await?;
/// let resolver = DependencyGraphResolver::new(Arc::new(store), DependencyTable::standard());
/// ```
#[derive(Clone, Debug)]
pub struct MongoDocumentStore {
    database: Database,
}

impl MongoDocumentStore {
    /// Create a new `MongoDocumentStore` with the given database handle.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Connect to `uri` and use database `name`.
    pub async fn from_uri(uri: &str, name: &str) -> Result<Self, StorageError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| StorageError::ConnectionError {
                backend: "mongodb".to_string(),
                message: e.to_string(),
            })?;

        tracing::info!(database = %name, "connected to mongodb");
        Ok(Self::new(client.database(name)))
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection(&self, entity: EntityType) -> mongodb::Collection<Document> {
        self.database.collection(entity.collection())
    }

    /// Insert raw documents into the collection of `entity`.
    pub async fn insert_many(&self, entity: EntityType, documents: Vec<Value>) -> Result<()> {
        let docs = documents
            .iter()
            .map(json_to_document)
            .collect::<Result<Vec<_>>>()?;

        if docs.is_empty() {
            return Ok(());
        }

        self.collection(entity)
            .insert_many(docs)
            .await
            .map_err(|e| anyhow!("Failed to insert {} documents: {}", entity, e))?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn find_many(
        &self,
        entity: EntityType,
        filter: &Filter,
        projection: Option<&[&str]>,
    ) -> Result<Vec<JsonDocument>> {
        let collection = self.collection(entity);
        let mut find = collection.find(filter_to_document(filter));
        if let Some(fields) = projection {
            find = find.projection(projection_document(fields));
        }

        let cursor = find
            .await
            .map_err(|e| anyhow!("Failed to find {} documents: {}", entity, e))?;

        let docs: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect {} documents: {}", entity, e))?;

        Ok(docs.into_iter().map(document_to_map).collect())
    }

    async fn find_one(&self, entity: EntityType, filter: &Filter) -> Result<Option<JsonDocument>> {
        let doc = self
            .collection(entity)
            .find_one(filter_to_document(filter))
            .await
            .map_err(|e| anyhow!("Failed to get {}: {}", entity, e))?;

        Ok(doc.map(document_to_map))
    }

    async fn count(&self, entity: EntityType, filter: &Filter) -> Result<u64> {
        self.collection(entity)
            .count_documents(filter_to_document(filter))
            .await
            .map_err(|e| anyhow!("Failed to count {} documents: {}", entity, e))
    }

    async fn delete_many(&self, entity: EntityType, filter: &Filter) -> Result<u64> {
        let result = self
            .collection(entity)
            .delete_many(filter_to_document(filter))
            .await
            .map_err(|e| anyhow!("Failed to delete {} documents: {}", entity, e))?;

        Ok(result.deleted_count)
    }

    async fn update_many(
        &self,
        entity: EntityType,
        filter: &Filter,
        payload: &Map<String, Value>,
    ) -> Result<u64> {
        let update = doc! { "$set": map_to_document(payload) };

        let result = self
            .collection(entity)
            .update_many(filter_to_document(filter), update)
            .await
            .map_err(|e| anyhow!("Failed to update {} documents: {}", entity, e))?;

        Ok(result.matched_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OID: &str = "64b7f1c2a9e4d3b2c1a0f9e8";

    // -----------------------------------------------------------------------
    // json <-> bson
    // -----------------------------------------------------------------------

    #[test]
    fn json_to_document_converts_hex_ids() {
        let doc = json_to_document(&json!({"_id": OID, "name": "test", "age": 42})).unwrap();

        assert!(matches!(doc.get("_id"), Some(Bson::ObjectId(_))));
        assert_eq!(doc.get_str("name").unwrap(), "test");
        assert_eq!(doc.get_i64("age").unwrap(), 42);
    }

    #[test]
    fn json_to_document_non_object_returns_error() {
        let err = json_to_document(&json!("string")).unwrap_err().to_string();
        assert!(err.contains("non-object"), "got: {err}");
    }

    #[test]
    fn short_hex_strings_stay_strings() {
        assert_eq!(json_to_bson(&json!("abc123")), Bson::String("abc123".into()));
    }

    #[test]
    fn document_to_map_renders_object_ids_as_hex() {
        let oid = ObjectId::parse_str(OID).unwrap();
        let doc = doc! { "_id": oid, "refs": [oid], "nested": { "by": oid }, "n": 1 };

        let map = document_to_map(doc);
        assert_eq!(map["_id"], json!(OID));
        assert_eq!(map["refs"], json!([OID]));
        assert_eq!(map["nested"]["by"], json!(OID));
        assert_eq!(map["n"], json!(1));
    }

    // -----------------------------------------------------------------------
    // filters
    // -----------------------------------------------------------------------

    #[test]
    fn in_filter_uses_object_ids() {
        let filter = Filter::any_field_in(&["addedBy", "updatedBy"], &[json!(OID)]);
        let query = filter_to_document(&filter);

        let branches = query.get_array("$or").unwrap();
        assert_eq!(branches.len(), 2);
        let first = branches[0].as_document().unwrap();
        let values = first.get_document("addedBy").unwrap().get_array("$in").unwrap();
        assert!(matches!(values[0], Bson::ObjectId(_)));
    }

    #[test]
    fn empty_filters() {
        assert!(filter_to_document(&Filter::all()).is_empty());

        let never = filter_to_document(&Filter::or(vec![]));
        assert!(never.contains_key(ID_FIELD));
    }

    #[test]
    fn projection_always_keeps_id() {
        let projection = projection_document(&["title"]);
        assert_eq!(projection.get_i32(ID_FIELD).unwrap(), 1);
        assert_eq!(projection.get_i32("title").unwrap(), 1);
    }
}
