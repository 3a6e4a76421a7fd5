//! Entity relationship graph for cascades
//!
//! Maps each root entity type to the types that reference it and the fields
//! holding those references. The table is a plain value handed to the
//! resolver; nothing is registered globally.

use crate::core::entity::{ADDED_BY, EntityType, UPDATED_BY};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reference field linking a UserTokens / UserRole record to its user
pub const USER_ID: &str = "userId";

/// A type that references a root, and the fields carrying the reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentRef {
    pub entity: EntityType,
    pub fields: Vec<String>,
}

impl DependentRef {
    pub fn new<F: AsRef<str>>(entity: EntityType, fields: &[F]) -> Self {
        Self {
            entity,
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
        }
    }
}

/// Root type → declared dependents
///
/// Dependents are kept in declaration order; the resolver visits and reports
/// them in that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyTable {
    dependents: HashMap<EntityType, Vec<DependentRef>>,
}

impl DependencyTable {
    /// Empty table: every type is a leaf
    pub fn new() -> Self {
        Self::default()
    }

    /// The course catalog's relationship graph
    pub fn standard() -> Self {
        let audit = [ADDED_BY, UPDATED_BY];
        let owned = [USER_ID, ADDED_BY, UPDATED_BY];

        Self::new()
            .with_dependents(
                EntityType::Category,
                vec![DependentRef::new(EntityType::Course, &["Live", "Recorded"])],
            )
            .with_dependents(
                EntityType::Instructor,
                vec![DependentRef::new(EntityType::Course, &["instructorName"])],
            )
            .with_dependents(
                EntityType::Course,
                vec![
                    DependentRef::new(EntityType::Category, &["Live", "Recorded"]),
                    DependentRef::new(EntityType::Instructor, &["instructorName"]),
                ],
            )
            .with_dependents(
                EntityType::User,
                vec![
                    DependentRef::new(EntityType::Category, &audit),
                    DependentRef::new(EntityType::Instructor, &audit),
                    DependentRef::new(EntityType::Course, &audit),
                    DependentRef::new(EntityType::User, &audit),
                    DependentRef::new(EntityType::UserTokens, &owned),
                    DependentRef::new(EntityType::Role, &audit),
                    DependentRef::new(EntityType::ProjectRoute, &audit),
                    DependentRef::new(EntityType::RouteRole, &audit),
                    DependentRef::new(EntityType::UserRole, &owned),
                ],
            )
            .with_dependents(
                EntityType::Role,
                vec![
                    DependentRef::new(EntityType::RouteRole, &["roleId"]),
                    DependentRef::new(EntityType::UserRole, &["roleId"]),
                ],
            )
            .with_dependents(
                EntityType::ProjectRoute,
                vec![DependentRef::new(EntityType::RouteRole, &["routeId"])],
            )
    }

    /// Declare the dependents of `root`, replacing any previous declaration
    pub fn with_dependents(mut self, root: EntityType, dependents: Vec<DependentRef>) -> Self {
        self.set_dependents(root, dependents);
        self
    }

    pub fn set_dependents(&mut self, root: EntityType, dependents: Vec<DependentRef>) {
        if dependents.is_empty() {
            self.dependents.remove(&root);
        } else {
            self.dependents.insert(root, dependents);
        }
    }

    /// Declared dependents of `root`, empty for leaf types
    pub fn dependents_of(&self, root: EntityType) -> &[DependentRef] {
        self.dependents
            .get(&root)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// A leaf has no declared dependents and is operated on directly
    pub fn is_leaf(&self, root: EntityType) -> bool {
        self.dependents_of(root).is_empty()
    }

    /// Whether `root` lists itself among its own dependents
    pub fn references_self(&self, root: EntityType) -> bool {
        self.dependents_of(root).iter().any(|d| d.entity == root)
    }

    /// Root types with at least one dependent, in declaration order of [`EntityType::ALL`]
    pub fn roots(&self) -> Vec<EntityType> {
        EntityType::ALL
            .into_iter()
            .filter(|t| self.dependents.contains_key(t))
            .collect()
    }
}
