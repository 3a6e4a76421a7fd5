//! Data-access trait consumed by the cascade resolver

use crate::core::entity::{Document, EntityType};
use crate::core::filter::Filter;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Generic document storage
///
/// One implementation serves every entity type; the [`EntityType`] argument
/// selects the collection. The resolver only ever calls these operations,
/// so any backend that implements them can be cascaded over.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Find all documents matching `filter`
    ///
    /// With a projection only the listed fields (plus `_id`) are returned.
    async fn find_many(
        &self,
        entity: EntityType,
        filter: &Filter,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Document>>;

    /// Find the first document matching `filter`
    async fn find_one(&self, entity: EntityType, filter: &Filter) -> Result<Option<Document>>;

    /// Count documents matching `filter`
    async fn count(&self, entity: EntityType, filter: &Filter) -> Result<u64>;

    /// Remove documents matching `filter`, returning how many were removed
    async fn delete_many(&self, entity: EntityType, filter: &Filter) -> Result<u64>;

    /// Set the fields of `payload` on every document matching `filter`
    ///
    /// Returns the number of matched documents.
    async fn update_many(
        &self,
        entity: EntityType,
        filter: &Filter,
        payload: &Map<String, Value>,
    ) -> Result<u64>;
}
