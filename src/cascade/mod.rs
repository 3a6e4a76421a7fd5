//! Cascading delete, count and soft-delete
//!
//! - [`registry`]: which entity types reference which, and through which fields
//! - [`action`]: cascade modes, soft-delete payloads and result summaries
//! - [`resolver`]: walks the table and applies a mode through a [`DocumentStore`](crate::core::store::DocumentStore)
//! - [`handlers`]: axum handlers for the delete family of endpoints

pub mod action;
pub mod handlers;
pub mod registry;
pub mod resolver;

pub use action::{CascadeAction, CascadeMode, CascadeSummary, UpdatePayload};
pub use handlers::{
    ACTOR_HEADER, CascadeState, delete_many, delete_one, soft_delete_many, soft_delete_one,
};
pub use registry::{DependencyTable, DependentRef};
pub use resolver::{DependencyGraphResolver, ResolverOptions};
