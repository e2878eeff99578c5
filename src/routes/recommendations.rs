use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::{CurrentUser, RequestId},
    routes::{
        listing::{ListParams, RecommendationPage},
        AppState,
    },
};

#[derive(Debug, Deserialize)]
pub struct QueryListRequest {
    pub manga_ids: Vec<i32>,
}

/// Handler for collection-based recommendations
pub async fn recommend_for_collection(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
    Path(collection_id): Path<i32>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<RecommendationPage>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %user_id,
        collection_id,
        "Processing collection recommendation request"
    );

    let outcome = state
        .recommendations
        .for_collection(user_id, collection_id)
        .await?;

    Ok(Json(params.paginate(outcome)?))
}

/// Handler for recommendations seeded by a client-provided id list
///
/// The list is not persisted and the result is not cached.
pub async fn recommend_for_list(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<ListParams>,
    Json(request): Json<QueryListRequest>,
) -> AppResult<Json<RecommendationPage>> {
    tracing::info!(
        request_id = %request_id,
        manga_count = request.manga_ids.len(),
        "Processing list recommendation request"
    );

    let outcome = state.recommendations.for_list(&request.manga_ids).await?;

    Ok(Json(params.paginate(outcome)?))
}

/// Drops every cached recommendation set of the caller (after a rating change)
pub async fn invalidate_user_cache(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<StatusCode> {
    state.recommendations.invalidate_user(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Drops the cached recommendation set of one collection (after a membership change)
pub async fn invalidate_collection_cache(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(collection_id): Path<i32>,
) -> StatusCode {
    state
        .recommendations
        .invalidate_collection(user_id, collection_id)
        .await;
    StatusCode::NO_CONTENT
}
