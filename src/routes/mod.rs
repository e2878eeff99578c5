use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::{
    middleware::{
        make_span_with_request_id, rate_limit_middleware, request_id_middleware,
        RecommendationRateLimiter,
    },
    services::RecommendationService,
};

pub mod listing;
pub mod recommendations;

/// Shared application state
pub struct AppState {
    pub recommendations: RecommendationService,
    pub rate_limiter: Arc<RecommendationRateLimiter>,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state.rate_limiter.clone()))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

/// API routes under /api/v1
///
/// Only the endpoints that run the generator are rate limited.
fn api_routes(rate_limiter: Arc<RecommendationRateLimiter>) -> Router<Arc<AppState>> {
    let generation = Router::new()
        .route(
            "/recommendations/query-list",
            post(recommendations::recommend_for_list),
        )
        .route(
            "/recommendations/:collection_id",
            get(recommendations::recommend_for_collection),
        )
        .route_layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    Router::new()
        .route(
            "/recommendations/cache",
            delete(recommendations::invalidate_user_cache),
        )
        .route(
            "/recommendations/:collection_id/cache",
            delete(recommendations::invalidate_collection_cache),
        )
        .merge(generation)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
