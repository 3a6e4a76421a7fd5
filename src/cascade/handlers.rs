//! HTTP handlers for the delete family
//!
//! These handlers are entity-agnostic: the entity type comes from the path
//! and the cascade is driven by the resolver held in [`CascadeState`]. Route
//! wiring is left to the host application, e.g.
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/{entity}/delete/{id}", delete(delete_one))
//!     .route("/{entity}/deleteMany", post(delete_many))
//!     .route("/{entity}/softDelete/{id}", put(soft_delete_one))
//!     .route("/{entity}/softDeleteMany", put(soft_delete_many))
//!     .with_state(CascadeState::new(resolver))
//! ```

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::HeaderMap,
};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use validator::Validate;

use crate::cascade::action::{CascadeAction, CascadeSummary, UpdatePayload};
use crate::cascade::resolver::DependencyGraphResolver;
use crate::core::entity::{EntityType, ID_FIELD};
use crate::core::error::{AppResult, RequestError, ValidationError};
use crate::core::filter::Filter;
use crate::core::response::ApiResponse;

/// Header carrying the authenticated user's id, set by the upstream auth layer
pub const ACTOR_HEADER: &str = "x-user-id";

/// Application state shared across handlers
#[derive(Clone)]
pub struct CascadeState {
    pub resolver: DependencyGraphResolver,
}

impl CascadeState {
    pub fn new(resolver: DependencyGraphResolver) -> Self {
        Self { resolver }
    }
}

/// Body of a single delete
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    /// Only report what would be deleted
    #[serde(default)]
    pub is_warning: bool,
}

/// Body of a bulk delete
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteManyRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "ids is required"))]
    pub ids: Vec<String>,

    #[serde(default)]
    pub is_warning: bool,
}

/// Body of a bulk soft delete
#[derive(Debug, Deserialize, Validate)]
pub struct SoftDeleteManyRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "ids is required"))]
    pub ids: Vec<String>,
}

/// Read the actor id placed on the request by the auth layer
pub fn extract_actor(headers: &HeaderMap) -> Result<String, RequestError> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| RequestError::MissingActor {
            header: ACTOR_HEADER.to_string(),
        })
}

/// Check that `id` is a 24-hex-digit document id
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    static OBJECT_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = OBJECT_ID_REGEX.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{24}$").unwrap());

    if regex.is_match(id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidId {
            value: id.to_string(),
        })
    }
}

fn validate_ids<V: Validate>(request: &V, ids: &[String]) -> Result<(), ValidationError> {
    // `ids` is the only validated field
    request.validate().map_err(|_| ValidationError::EmptyIds)?;

    ids.iter().try_for_each(|id| validate_id(id))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ValidationError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ValidationError::InvalidJson {
            message: e.body_text(),
        })
}

fn warning_action(is_warning: bool) -> CascadeAction {
    if is_warning {
        CascadeAction::Count
    } else {
        CascadeAction::Delete
    }
}

async fn run(
    state: &CascadeState,
    entity: EntityType,
    filter: Filter,
    action: CascadeAction,
) -> AppResult<ApiResponse<CascadeSummary>> {
    let summary = state.resolver.resolve(entity, &filter, &action).await?;
    Ok(ApiResponse::success(summary))
}

/// Delete one record and its dependents, or count them when `isWarning` is set
pub async fn delete_one(
    State(state): State<CascadeState>,
    Path((entity, id)): Path<(String, String)>,
    payload: Result<Option<Json<DeleteRequest>>, JsonRejection>,
) -> AppResult<ApiResponse<CascadeSummary>> {
    let entity: EntityType = entity.parse()?;
    validate_id(&id)?;

    // No body means a plain delete
    let request = json_body(payload.map(|body| body.unwrap_or(Json(DeleteRequest::default()))))?;

    run(
        &state,
        entity,
        Filter::eq(ID_FIELD, id),
        warning_action(request.is_warning),
    )
    .await
}

/// Delete several records and their dependents, or count them when `isWarning` is set
pub async fn delete_many(
    State(state): State<CascadeState>,
    Path(entity): Path<String>,
    payload: Result<Json<DeleteManyRequest>, JsonRejection>,
) -> AppResult<ApiResponse<CascadeSummary>> {
    let entity: EntityType = entity.parse()?;
    let request = json_body(payload)?;
    validate_ids(&request, &request.ids)?;

    let action = warning_action(request.is_warning);
    run(&state, entity, Filter::is_in(ID_FIELD, request.ids), action).await
}

/// Mark one record and its dependents deleted
pub async fn soft_delete_one(
    State(state): State<CascadeState>,
    Path((entity, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> AppResult<ApiResponse<CascadeSummary>> {
    let actor = extract_actor(&headers)?;
    let entity: EntityType = entity.parse()?;
    validate_id(&id)?;

    let payload = UpdatePayload::soft_delete(actor);
    run(
        &state,
        entity,
        Filter::eq(ID_FIELD, id),
        CascadeAction::SoftDelete(payload),
    )
    .await
}

/// Mark several records and their dependents deleted
pub async fn soft_delete_many(
    State(state): State<CascadeState>,
    Path(entity): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<SoftDeleteManyRequest>, JsonRejection>,
) -> AppResult<ApiResponse<CascadeSummary>> {
    let actor = extract_actor(&headers)?;
    let entity: EntityType = entity.parse()?;
    let request = json_body(payload)?;
    validate_ids(&request, &request.ids)?;

    let payload = UpdatePayload::soft_delete(actor);
    run(
        &state,
        entity,
        Filter::is_in(ID_FIELD, request.ids),
        CascadeAction::SoftDelete(payload),
    )
    .await
}
