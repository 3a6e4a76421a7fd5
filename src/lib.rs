//! # coursehub
//!
//! Cascading delete, count and soft-delete for a course catalog stored in a
//! document database.
//!
//! ## Features
//!
//! - **Dependency Graph**: each entity type declares which types reference it and through which fields
//! - **Three Modes**: hard delete, dry-run count (`isWarning`) and soft delete
//! - **Per-Type Summaries**: every cascade reports affected records per entity type
//! - **Pluggable Storage**: any [`DocumentStore`](core::store::DocumentStore) can be cascaded over
//! - **Configuration-Based**: load the relationship graph from YAML
//! - **HTTP Handlers**: axum handlers rendering the `{status, message, data}` envelope
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use coursehub::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryDocumentStore::new());
//! let resolver = DependencyGraphResolver::new(store, DependencyTable::standard());
//!
//! // What would deleting this instructor take down with it?
//! let summary = resolver
//!     .count(EntityType::Instructor, &Filter::eq("_id", instructor_id))
//!     .await?;
//!
//! // Soft delete a user and everything they created
//! let payload = UpdatePayload::soft_delete(actor_id);
//! resolver
//!     .soft_delete(EntityType::User, &Filter::eq("_id", user_id), &payload)
//!     .await?;
//! ```

pub mod cascade;
pub mod config;
pub mod core;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        entity::{Document, EntityType},
        error::{AppError, AppResult, DependencyResolutionError},
        filter::Filter,
        response::ApiResponse,
        store::DocumentStore,
    };

    // === Cascade ===
    pub use crate::cascade::{
        CascadeAction, CascadeMode, CascadeSummary, DependencyGraphResolver, DependencyTable,
        DependentRef, ResolverOptions, UpdatePayload,
        handlers::{
            CascadeState, delete_many, delete_one, soft_delete_many, soft_delete_one,
        },
    };

    // === Storage ===
    pub use crate::storage::InMemoryDocumentStore;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoDocumentStore;

    // === Config ===
    pub use crate::config::{CascadeConfig, DependencyRule};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
}
