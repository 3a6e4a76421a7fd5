//! Shared test harness for cascade testing
//!
//! Provides a small course catalog fixture spanning all nine entity types and
//! `RecordingStore`, a `DocumentStore` wrapper that records every call and can
//! be told to fail a specific one.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! mod cascade_harness;
//! use cascade_harness::*;
//! ```

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};

use coursehub::core::entity::{Document, EntityType};
use coursehub::core::filter::Filter;
use coursehub::core::store::DocumentStore;
use coursehub::storage::InMemoryDocumentStore;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// A 24-hex-digit document id
pub fn oid(n: u32) -> String {
    format!("{:024x}", n)
}

pub const USER1: &str = "000000000000000000000100";
pub const USER2: &str = "000000000000000000000101";
pub const USER3: &str = "000000000000000000000102";

pub const CATEGORY1: &str = "000000000000000000000200";
pub const CATEGORY2: &str = "000000000000000000000201";

pub const INSTRUCTOR1: &str = "000000000000000000000300";
pub const INSTRUCTOR2: &str = "000000000000000000000301";

pub const COURSE1: &str = "000000000000000000000400";
pub const COURSE2: &str = "000000000000000000000401";
pub const COURSE3: &str = "000000000000000000000402";

pub const ROLE1: &str = "000000000000000000000500";
pub const ROLE2: &str = "000000000000000000000501";

pub const ROUTE1: &str = "000000000000000000000600";
pub const ROUTE2: &str = "000000000000000000000601";

pub const ROUTE_ROLE1: &str = "000000000000000000000700";
pub const ROUTE_ROLE2: &str = "000000000000000000000701";
pub const ROUTE_ROLE3: &str = "000000000000000000000702";

pub const USER_ROLE1: &str = "000000000000000000000800";
pub const USER_ROLE2: &str = "000000000000000000000801";

pub const TOKEN1: &str = "000000000000000000000900";
pub const TOKEN2: &str = "000000000000000000000901";
pub const TOKEN3: &str = "000000000000000000000902";

/// Id of the user performing soft deletes
pub const ACTOR: &str = "000000000000000000000a00";

// ---------------------------------------------------------------------------
// Catalog fixture
// ---------------------------------------------------------------------------

/// The course catalog, grouped by entity type
///
/// user1 created one of everything; user2 created the rest. user3 was added
/// by user1. Courses reference categories through `Live` / `Recorded` and
/// instructors through `instructorName`.
pub fn catalog() -> Vec<(EntityType, Vec<Value>)> {
    vec![
        (
            EntityType::User,
            vec![
                json!({"_id": USER1, "username": "ada", "isDeleted": false}),
                json!({"_id": USER2, "username": "linus", "isDeleted": false}),
                json!({"_id": USER3, "username": "grace", "addedBy": USER1, "isDeleted": false}),
            ],
        ),
        (
            EntityType::Category,
            vec![
                json!({"_id": CATEGORY1, "name": "Systems", "addedBy": USER1}),
                json!({"_id": CATEGORY2, "name": "Web", "addedBy": USER2}),
            ],
        ),
        (
            EntityType::Instructor,
            vec![
                json!({"_id": INSTRUCTOR1, "name": "A", "addedBy": USER1}),
                json!({"_id": INSTRUCTOR2, "name": "B", "addedBy": USER2}),
            ],
        ),
        (
            EntityType::Course,
            vec![
                json!({
                    "_id": COURSE1,
                    "title": "Rust in Practice",
                    "Live": CATEGORY1,
                    "instructorName": INSTRUCTOR1,
                    "addedBy": USER1
                }),
                json!({
                    "_id": COURSE2,
                    "title": "Operating Systems",
                    "Recorded": CATEGORY1,
                    "instructorName": INSTRUCTOR2,
                    "addedBy": USER2,
                    "updatedBy": USER1
                }),
                json!({
                    "_id": COURSE3,
                    "title": "HTTP Deep Dive",
                    "Live": CATEGORY2,
                    "instructorName": INSTRUCTOR2,
                    "addedBy": USER2
                }),
            ],
        ),
        (
            EntityType::Role,
            vec![
                json!({"_id": ROLE1, "name": "admin", "addedBy": USER1}),
                json!({"_id": ROLE2, "name": "student", "addedBy": USER2}),
            ],
        ),
        (
            EntityType::ProjectRoute,
            vec![
                json!({"_id": ROUTE1, "route_name": "course/list", "addedBy": USER1}),
                json!({"_id": ROUTE2, "route_name": "course/create", "addedBy": USER2}),
            ],
        ),
        (
            EntityType::RouteRole,
            vec![
                json!({"_id": ROUTE_ROLE1, "roleId": ROLE1, "routeId": ROUTE1, "addedBy": USER2}),
                json!({"_id": ROUTE_ROLE2, "roleId": ROLE2, "routeId": ROUTE1, "addedBy": USER2}),
                json!({"_id": ROUTE_ROLE3, "roleId": ROLE1, "routeId": ROUTE2, "addedBy": USER1}),
            ],
        ),
        (
            EntityType::UserRole,
            vec![
                json!({"_id": USER_ROLE1, "userId": USER1, "roleId": ROLE1, "addedBy": USER2}),
                json!({"_id": USER_ROLE2, "userId": USER2, "roleId": ROLE2, "addedBy": USER2}),
            ],
        ),
        (
            EntityType::UserTokens,
            vec![
                json!({"_id": TOKEN1, "userId": USER1, "token": "t1"}),
                json!({"_id": TOKEN2, "userId": USER2, "token": "t2"}),
                json!({"_id": TOKEN3, "userId": USER1, "token": "t3"}),
            ],
        ),
    ]
}

/// In-memory store seeded with [`catalog`]
pub fn seeded_store() -> InMemoryDocumentStore {
    let store = InMemoryDocumentStore::new();
    for (entity, docs) in catalog() {
        store.insert_many(entity, docs).unwrap();
    }
    store
}

/// Number of documents of each type, in [`EntityType::ALL`] order
pub async fn snapshot(store: &dyn DocumentStore) -> Vec<(EntityType, u64)> {
    let mut counts = Vec::new();
    for entity in EntityType::ALL {
        counts.push((entity, store.count(entity, &Filter::all()).await.unwrap()));
    }
    counts
}

/// Fetch a single document by id
pub async fn get(store: &dyn DocumentStore, entity: EntityType, id: &str) -> Option<Document> {
    store
        .find_one(entity, &Filter::eq("_id", id))
        .await
        .unwrap()
}

pub fn is_soft_deleted(doc: &Document) -> bool {
    doc.get("isDeleted") == Some(&Value::Bool(true))
}

// ---------------------------------------------------------------------------
// RecordingStore
// ---------------------------------------------------------------------------

/// One call made against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCall {
    pub op: &'static str,
    pub entity: EntityType,
}

impl StoreCall {
    pub fn new(op: &'static str, entity: EntityType) -> Self {
        Self { op, entity }
    }

    pub fn is_write(&self) -> bool {
        matches!(self.op, "delete_many" | "update_many")
    }
}

/// Wraps a store, logging calls in order and optionally failing one of them
pub struct RecordingStore {
    inner: Arc<dyn DocumentStore>,
    calls: Mutex<Vec<StoreCall>>,
    fail_on: Option<StoreCall>,
}

impl RecordingStore {
    pub fn new(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
            fail_on: None,
        }
    }

    /// Make `op` against `entity` fail with a connection error
    pub fn fail_on(mut self, op: &'static str, entity: EntityType) -> Self {
        self.fail_on = Some(StoreCall::new(op, entity));
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls().into_iter().filter(StoreCall::is_write).collect()
    }

    fn record(&self, op: &'static str, entity: EntityType) -> Result<()> {
        let call = StoreCall::new(op, entity);
        self.calls.lock().unwrap().push(call);
        if self.fail_on == Some(call) {
            return Err(anyhow!("connection reset while running {} on {}", op, entity));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn find_many(
        &self,
        entity: EntityType,
        filter: &Filter,
        projection: Option<&[&str]>,
    ) -> Result<Vec<Document>> {
        self.record("find_many", entity)?;
        self.inner.find_many(entity, filter, projection).await
    }

    async fn find_one(&self, entity: EntityType, filter: &Filter) -> Result<Option<Document>> {
        self.record("find_one", entity)?;
        self.inner.find_one(entity, filter).await
    }

    async fn count(&self, entity: EntityType, filter: &Filter) -> Result<u64> {
        self.record("count", entity)?;
        self.inner.count(entity, filter).await
    }

    async fn delete_many(&self, entity: EntityType, filter: &Filter) -> Result<u64> {
        self.record("delete_many", entity)?;
        self.inner.delete_many(entity, filter).await
    }

    async fn update_many(
        &self,
        entity: EntityType,
        filter: &Filter,
        payload: &Map<String, Value>,
    ) -> Result<u64> {
        self.record("update_many", entity)?;
        self.inner.update_many(entity, filter, payload).await
    }
}
