//! Cascade modes, payloads and results

use crate::core::entity::{EntityType, IS_DELETED, UPDATED_BY};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// How a cascade affects the records it reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    /// Physically remove records
    Delete,
    /// Read-only dry run reporting what would be affected
    Count,
    /// Mark records deleted in place
    SoftDelete,
}

impl CascadeMode {
    /// Whether this mode writes to the store
    pub fn is_mutating(&self) -> bool {
        !matches!(self, CascadeMode::Count)
    }
}

impl fmt::Display for CascadeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadeMode::Delete => write!(f, "delete"),
            CascadeMode::Count => write!(f, "count"),
            CascadeMode::SoftDelete => write!(f, "soft-delete"),
        }
    }
}

/// Fields written by a soft delete
///
/// # Example
///
/// ```rust
/// use coursehub::cascade::UpdatePayload;
///
/// let payload = UpdatePayload::soft_delete("64b7f1c2a9e4d3b2c1a0f9e8");
/// assert_eq!(payload.get("isDeleted"), Some(&serde_json::json!(true)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdatePayload(Map<String, Value>);

impl UpdatePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// `{isDeleted: true, updatedBy: actor}`
    pub fn soft_delete(actor: impl Into<String>) -> Self {
        let actor: String = actor.into();
        Self::new().set(IS_DELETED, true).set(UPDATED_BY, actor)
    }

    /// Add or replace a field
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for UpdatePayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A requested cascade
///
/// The soft-delete payload travels with the variant, so a soft delete
/// without fields to set cannot be expressed.
#[derive(Debug, Clone, PartialEq)]
pub enum CascadeAction {
    Delete,
    Count,
    SoftDelete(UpdatePayload),
}

impl CascadeAction {
    pub fn mode(&self) -> CascadeMode {
        match self {
            CascadeAction::Delete => CascadeMode::Delete,
            CascadeAction::Count => CascadeMode::Count,
            CascadeAction::SoftDelete(_) => CascadeMode::SoftDelete,
        }
    }
}

/// Affected-record counts per entity type
///
/// Serializes as a flat JSON object keyed by entity key (`course`,
/// `userTokens`, ...) in the order the cascade reached each type. The shape
/// is returned verbatim to HTTP clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CascadeSummary(IndexMap<String, u64>);

impl CascadeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary with a single entry
    pub fn single(entity: EntityType, count: u64) -> Self {
        let mut summary = Self::new();
        summary.add(entity, count);
        summary
    }

    /// Add `count` to the entry for `entity`, creating it if needed
    pub fn add(&mut self, entity: EntityType, count: u64) {
        *self.0.entry(entity.key().to_string()).or_insert(0) += count;
    }

    pub fn get(&self, entity: EntityType) -> Option<u64> {
        self.0.get(entity.key()).copied()
    }

    /// Look up an entry by its raw key
    pub fn get_key(&self, key: &str) -> Option<u64> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all entries
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl fmt::Display for CascadeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
