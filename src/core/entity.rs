//! Entity types managed by the backend
//!
//! Every record is a schemaless JSON document. What the framework needs to know
//! about an entity is its type: the key it is reported under in cascade
//! summaries, and the collection it lives in.

use crate::core::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A stored record
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Field holding the document identifier
pub const ID_FIELD: &str = "_id";

/// Audit field: identifier of the user who created the record
pub const ADDED_BY: &str = "addedBy";

/// Audit field: identifier of the user who last updated the record
pub const UPDATED_BY: &str = "updatedBy";

/// Soft-deletion flag
pub const IS_DELETED: &str = "isDeleted";

/// The entity types known to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityType {
    Category,
    Instructor,
    Course,
    User,
    UserTokens,
    Role,
    ProjectRoute,
    RouteRole,
    UserRole,
}

impl EntityType {
    /// All entity types, in declaration order
    pub const ALL: [EntityType; 9] = [
        EntityType::Category,
        EntityType::Instructor,
        EntityType::Course,
        EntityType::User,
        EntityType::UserTokens,
        EntityType::Role,
        EntityType::ProjectRoute,
        EntityType::RouteRole,
        EntityType::UserRole,
    ];

    /// Key used for this type in cascade summaries and request paths
    ///
    /// These keys are part of the HTTP response contract and must not change.
    pub fn key(&self) -> &'static str {
        match self {
            EntityType::Category => "category",
            EntityType::Instructor => "instructor",
            EntityType::Course => "course",
            EntityType::User => "user",
            EntityType::UserTokens => "userTokens",
            EntityType::Role => "role",
            EntityType::ProjectRoute => "projectRoute",
            EntityType::RouteRole => "routeRole",
            EntityType::UserRole => "userRole",
        }
    }

    /// Name of the document collection backing this type
    pub fn collection(&self) -> &'static str {
        match self {
            EntityType::Category => "categories",
            EntityType::Instructor => "instructors",
            EntityType::Course => "courses",
            EntityType::User => "users",
            EntityType::UserTokens => "usertokens",
            EntityType::Role => "roles",
            EntityType::ProjectRoute => "projectroutes",
            EntityType::RouteRole => "routeroles",
            EntityType::UserRole => "userroles",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for EntityType {
    type Err = ValidationError;

    /// Accepts the summary key (`userTokens`) or, case-insensitively, the
    /// collection-style spelling used in URLs (`usertokens`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|t| t.key() == s || t.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownEntityType {
                name: s.to_string(),
            })
    }
}
