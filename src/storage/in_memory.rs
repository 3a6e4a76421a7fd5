//! In-memory implementation of DocumentStore for testing and development

use crate::core::entity::{Document, EntityType, ID_FIELD};
use crate::core::filter::Filter;
use crate::core::store::DocumentStore;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory document store
///
/// One vector of documents per entity type, in insertion order. Uses RwLock
/// for thread-safe access; clones share the same collections.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<EntityType, Vec<Document>>>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one document; it must be a JSON object
    pub fn insert(&self, entity: EntityType, document: Value) -> Result<()> {
        self.insert_many(entity, vec![document])
    }

    /// Insert several documents at once
    pub fn insert_many(&self, entity: EntityType, documents: Vec<Value>) -> Result<()> {
        let documents = documents
            .into_iter()
            .map(|doc| match doc {
                Value::Object(map) => Ok(map),
                other => Err(anyhow!("Expected a JSON object for {}, got {}", entity, other)),
            })
            .collect::<Result<Vec<_>>>()?;

        let mut collections = self
            .collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        collections.entry(entity).or_default().extend(documents);

        Ok(())
    }

    /// Snapshot of every document of `entity`
    pub fn all(&self, entity: EntityType) -> Result<Vec<Document>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(collections.get(&entity).cloned().unwrap_or_default())
    }
}

fn project(doc: &Document, fields: &[&str]) -> Document {
    doc.iter()
        .filter(|(key, _)| key.as_str() == ID_FIELD || fields.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_many(
        &self,
        entity: EntityType,
        filter: &Filter,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Document>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        let Some(docs) = collections.get(&entity) else {
            return Ok(Vec::new());
        };

        Ok(docs
            .iter()
            .filter(|doc| filter.matches(doc))
            .map(|doc| match projection {
                Some(fields) => project(doc, fields),
                None => doc.clone(),
            })
            .collect())
    }

    async fn find_one(&self, entity: EntityType, filter: &Filter) -> Result<Option<Document>> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(collections
            .get(&entity)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)))
            .cloned())
    }

    async fn count(&self, entity: EntityType, filter: &Filter) -> Result<u64> {
        let collections = self
            .collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?;

        Ok(collections
            .get(&entity)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).count() as u64)
            .unwrap_or(0))
    }

    async fn delete_many(&self, entity: EntityType, filter: &Filter) -> Result<u64> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(docs) = collections.get_mut(&entity) else {
            return Ok(0);
        };

        let before = docs.len();
        docs.retain(|doc| !filter.matches(doc));

        Ok((before - docs.len()) as u64)
    }

    async fn update_many(
        &self,
        entity: EntityType,
        filter: &Filter,
        payload: &Map<String, Value>,
    ) -> Result<u64> {
        let mut collections = self
            .collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let Some(docs) = collections.get_mut(&entity) else {
            return Ok(0);
        };

        let mut matched = 0;
        for doc in docs.iter_mut().filter(|doc| filter.matches(doc)) {
            for (field, value) in payload {
                doc.insert(field.clone(), value.clone());
            }
            matched += 1;
        }

        Ok(matched)
    }
}
