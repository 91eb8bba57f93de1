//! Matching service routes

use crate::constants::api::HEALTH_PATH;
use crate::geo::parse_point;
use crate::matching::MatchOutcome;
use crate::server::state::MatchingState;
use crate::server::ApiError;
use crate::wire::{ApiResponse, HealthResponse, MatchData, MatchRequest};

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the matching service router
pub fn create_router(state: Arc<MatchingState>) -> Router {
    Router::new()
        .route("/api/v1/match", post(match_handler))
        .route(HEALTH_PATH, get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Find the nearest driver to a rider
///
/// POST /api/v1/match
async fn match_handler(
    State(state): State<Arc<MatchingState>>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MatchData>>, ApiError> {
    let Json(req) = payload?;
    let rider = parse_point(&req.location)?;

    match state.resolver.find_nearest(rider).await? {
        MatchOutcome::Matched(driver) => Ok(Json(ApiResponse::ok(MatchData {
            id: driver.id,
            location: driver.point.to_geojson(),
            distance: driver.distance,
        }))),
        MatchOutcome::NotFound => Err(ApiError::not_found()),
    }
}

/// GET /health
async fn health_handler(State(state): State<Arc<MatchingState>>) -> Json<HealthResponse> {
    // Liveness only, never fails
    let _ = state.resolver.health_check().await;
    Json(HealthResponse::ok())
}
