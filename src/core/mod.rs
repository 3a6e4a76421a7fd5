//! Core module containing fundamental traits and types for the framework

pub mod entity;
pub mod error;
pub mod filter;
pub mod response;
pub mod store;

pub use entity::{Document, EntityType};
pub use error::{AppError, AppResult, DependencyResolutionError};
pub use filter::{Clause, Filter, Operator};
pub use response::ApiResponse;
pub use store::DocumentStore;
