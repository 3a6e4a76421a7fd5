//! Cascading delete, count and soft-delete across dependent entity types

use crate::cascade::action::{CascadeAction, CascadeMode, CascadeSummary, UpdatePayload};
use crate::cascade::registry::DependencyTable;
use crate::core::entity::{EntityType, ID_FIELD};
use crate::core::error::DependencyResolutionError;
use crate::core::filter::Filter;
use crate::core::store::DocumentStore;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

type ResolveResult<T> = Result<T, DependencyResolutionError>;

/// Tuning knobs for the resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverOptions {
    /// Issue dependent-type steps concurrently instead of one after another
    ///
    /// The root step still waits for every dependent step.
    #[serde(default)]
    pub concurrent_dependents: bool,
}

/// Applies delete / count / soft-delete to a root type and its dependents
///
/// For a root type with declared dependents, a cascade:
/// 1. collects the ids of root records matching the filter
/// 2. stops with `{root: 0}` if there are none
/// 3. applies the operation to every dependent type, matching records whose
///    reference fields point at one of those ids
/// 4. applies the operation to the root records themselves (not for count)
///
/// Leaf types skip straight to applying the operation to the root.
///
/// Only dependents of the root are visited. A dependent's own dependents are
/// never reached.
///
/// Cascades are **not atomic**: if a step fails, the steps before it stay
/// applied and the error names the step that failed.
///
/// # Example
///
/// ```rust,ignore
/// let store = Arc::new(InMemoryDocumentStore::new());
/// let resolver = DependencyGraphResolver::new(store, DependencyTable::standard());
///
/// let summary = resolver
///     .delete(EntityType::Instructor, &Filter::eq("_id", instructor_id))
///     .await?;
/// assert_eq!(summary.get(EntityType::Course), Some(1));
/// ```
#[derive(Clone)]
pub struct DependencyGraphResolver {
    store: Arc<dyn DocumentStore>,
    table: Arc<DependencyTable>,
    options: ResolverOptions,
}

impl DependencyGraphResolver {
    pub fn new(store: Arc<dyn DocumentStore>, table: DependencyTable) -> Self {
        Self {
            store,
            table: Arc::new(table),
            options: ResolverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn table(&self) -> &DependencyTable {
        &self.table
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Hard-delete root records matching `filter` and everything that references them
    pub async fn delete(&self, root: EntityType, filter: &Filter) -> ResolveResult<CascadeSummary> {
        self.resolve(root, filter, &CascadeAction::Delete).await
    }

    /// Report how many dependent records a delete would reach, without writing
    pub async fn count(&self, root: EntityType, filter: &Filter) -> ResolveResult<CascadeSummary> {
        self.resolve(root, filter, &CascadeAction::Count).await
    }

    /// Set `payload` on root records matching `filter` and on everything that references them
    pub async fn soft_delete(
        &self,
        root: EntityType,
        filter: &Filter,
        payload: &UpdatePayload,
    ) -> ResolveResult<CascadeSummary> {
        self.resolve(root, filter, &CascadeAction::SoftDelete(payload.clone()))
            .await
    }

    /// Run a cascade
    ///
    /// The summary holds one entry per dependent type, keyed by entity key.
    /// When the root lists itself as a dependent (users created by users),
    /// the root's own affected count is added into that entry. Counting never
    /// touches the root, so a count summary only reports dependents.
    pub async fn resolve(
        &self,
        root: EntityType,
        filter: &Filter,
        action: &CascadeAction,
    ) -> ResolveResult<CascadeSummary> {
        let mode = action.mode();
        let dependents = self.table.dependents_of(root);

        if dependents.is_empty() {
            let affected = self.apply(root, root, filter, action).await?;
            tracing::debug!(
                root = %root,
                mode = %mode,
                filter = %filter.to_query(),
                affected,
                "leaf operation applied"
            );
            return Ok(CascadeSummary::single(root, affected));
        }

        let ids = self.root_ids(root, filter, mode).await?;
        if ids.is_empty() {
            tracing::debug!(
                root = %root,
                mode = %mode,
                filter = %filter.to_query(),
                "no matching root records"
            );
            return Ok(CascadeSummary::single(root, 0));
        }

        let steps: Vec<(EntityType, Filter)> = dependents
            .iter()
            .map(|dep| (dep.entity, Filter::any_field_in(dep.fields.as_slice(), &ids)))
            .collect();

        let counts = if self.options.concurrent_dependents {
            try_join_all(
                steps
                    .iter()
                    .map(|(entity, dep_filter)| self.apply(root, *entity, dep_filter, action)),
            )
            .await?
        } else {
            let mut counts = Vec::with_capacity(steps.len());
            for (entity, dep_filter) in &steps {
                counts.push(self.apply(root, *entity, dep_filter, action).await?);
            }
            counts
        };

        let mut summary = CascadeSummary::new();
        for ((entity, _), affected) in steps.iter().zip(counts) {
            tracing::debug!(
                root = %root,
                mode = %mode,
                dependent = %entity,
                affected,
                "cascade step applied"
            );
            summary.add(*entity, affected);
        }

        if mode.is_mutating() {
            let own = self.apply(root, root, filter, action).await?;
            tracing::debug!(root = %root, mode = %mode, affected = own, "root records affected");
            if self.table.references_self(root) {
                summary.add(root, own);
            }
        }

        tracing::info!(
            root = %root,
            mode = %mode,
            roots = ids.len(),
            total = summary.total(),
            "cascade complete"
        );

        Ok(summary)
    }

    /// Distinct ids of root records matching `filter`, in first-seen order
    async fn root_ids(
        &self,
        root: EntityType,
        filter: &Filter,
        mode: CascadeMode,
    ) -> ResolveResult<Vec<Value>> {
        let records = self
            .store
            .find_many(root, filter, Some(&[ID_FIELD][..]))
            .await
            .map_err(|e| self.failure(root, mode, root, e))?;

        let mut seen = HashSet::new();
        Ok(records
            .into_iter()
            .filter_map(|mut doc| doc.remove(ID_FIELD))
            .filter(|id| !id.is_null())
            .filter(|id| seen.insert(id.to_string()))
            .collect())
    }

    /// Apply the action's terminal effect to `target`
    async fn apply(
        &self,
        root: EntityType,
        target: EntityType,
        filter: &Filter,
        action: &CascadeAction,
    ) -> ResolveResult<u64> {
        let result = match action {
            CascadeAction::Delete => self.store.delete_many(target, filter).await,
            CascadeAction::Count => self.store.count(target, filter).await,
            CascadeAction::SoftDelete(payload) => {
                self.store
                    .update_many(target, filter, payload.as_map())
                    .await
            }
        };

        result.map_err(|e| self.failure(root, action.mode(), target, e))
    }

    fn failure(
        &self,
        root: EntityType,
        mode: CascadeMode,
        step: EntityType,
        cause: anyhow::Error,
    ) -> DependencyResolutionError {
        tracing::warn!(
            root = %root,
            mode = %mode,
            step = %step,
            error = %cause,
            "cascade aborted"
        );
        DependencyResolutionError::new(root, mode, step, format!("{:#}", cause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryDocumentStore;
    use serde_json::json;

    async fn seeded() -> (Arc<InMemoryDocumentStore>, DependencyGraphResolver) {
        let store = Arc::new(InMemoryDocumentStore::new());
        store
            .insert_many(
                EntityType::Instructor,
                vec![json!({"_id": "A", "bio": "rust"}), json!({"_id": "B"})],
            )
            .unwrap();
        store
            .insert_many(
                EntityType::Course,
                vec![
                    json!({"_id": "c1", "instructorName": "A"}),
                    json!({"_id": "c2", "instructorName": "B"}),
                ],
            )
            .unwrap();

        let resolver = DependencyGraphResolver::new(store.clone(), DependencyTable::standard());
        (store, resolver)
    }

    #[tokio::test]
    async fn test_delete_instructor_removes_courses() {
        let (store, resolver) = seeded().await;

        let summary = resolver
            .delete(EntityType::Instructor, &Filter::eq("_id", "A"))
            .await
            .unwrap();

        assert_eq!(summary, CascadeSummary::single(EntityType::Course, 1));
        assert_eq!(store.all(EntityType::Course).unwrap().len(), 1);
        assert_eq!(store.all(EntityType::Instructor).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_count_instructor_leaves_data() {
        let (store, resolver) = seeded().await;

        let summary = resolver
            .count(EntityType::Instructor, &Filter::eq("_id", "A"))
            .await
            .unwrap();

        assert_eq!(summary.get(EntityType::Course), Some(1));
        assert_eq!(summary.get(EntityType::Instructor), None);
        assert_eq!(store.all(EntityType::Course).unwrap().len(), 2);
        assert_eq!(store.all(EntityType::Instructor).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_soft_delete_instructor_marks_records() {
        let (store, resolver) = seeded().await;
        let payload = UpdatePayload::soft_delete("U1");

        let summary = resolver
            .soft_delete(EntityType::Instructor, &Filter::eq("_id", "A"), &payload)
            .await
            .unwrap();

        assert_eq!(summary.get(EntityType::Course), Some(1));

        let course = store
            .find_one(EntityType::Course, &Filter::eq("_id", "c1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(course["isDeleted"], json!(true));
        assert_eq!(course["updatedBy"], json!("U1"));

        let instructor = store
            .find_one(EntityType::Instructor, &Filter::eq("_id", "A"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(instructor["isDeleted"], json!(true));
        assert_eq!(instructor["bio"], json!("rust"));
    }

    #[tokio::test]
    async fn test_no_match_is_noop() {
        let (store, resolver) = seeded().await;

        let summary = resolver
            .delete(EntityType::Instructor, &Filter::eq("_id", "missing"))
            .await
            .unwrap();

        assert_eq!(summary, CascadeSummary::single(EntityType::Instructor, 0));
        assert_eq!(store.all(EntityType::Course).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_leaf_type_operates_directly() {
        let store = Arc::new(InMemoryDocumentStore::new());
        store
            .insert_many(
                EntityType::UserTokens,
                vec![json!({"_id": "t1", "userId": "u1"}), json!({"_id": "t2", "userId": "u2"})],
            )
            .unwrap();
        let resolver = DependencyGraphResolver::new(store.clone(), DependencyTable::standard());

        let summary = resolver
            .delete(EntityType::UserTokens, &Filter::eq("userId", "u1"))
            .await
            .unwrap();

        assert_eq!(summary, CascadeSummary::single(EntityType::UserTokens, 1));
        assert_eq!(store.all(EntityType::UserTokens).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let (_, sequential) = seeded().await;
        let (_, concurrent) = seeded().await;
        let concurrent = concurrent.with_options(ResolverOptions {
            concurrent_dependents: true,
        });

        let filter = Filter::is_in("_id", ["A", "B"]);
        let a = sequential.count(EntityType::Instructor, &filter).await.unwrap();
        let b = concurrent.count(EntityType::Instructor, &filter).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.get(EntityType::Course), Some(2));
    }
}
