//! Location service routes
//!
//! Everything under `/api/v1` requires the `X-API-Key` header; `/health`
//! is public.

use crate::constants::api::{API_KEY_HEADER, HEALTH_PATH, SEARCH_PATH};
use crate::constants::messages;
use crate::error::Result;
use crate::geo::{parse_point, LocationPoint};
use crate::locations::{batch_item_error, SearchOutcome};
use crate::server::state::LocationsState;
use crate::server::ApiError;
use crate::wire::{
    ApiResponse, BulkData, CreateLocationBulkRequest, CreateLocationData, CreateLocationRequest,
    HealthResponse, LocationHit, SearchData, SearchRequest,
};

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Create the location service router
pub fn create_router(state: Arc<LocationsState>) -> Router {
    let api = Router::new()
        .route("/api/v1/locations", post(create_location_handler))
        .route("/api/v1/locations/batch", post(create_bulk_handler))
        .route(SEARCH_PATH, post(search_handler))
        .route("/api/v1/locations/import", post(import_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject requests without the configured `X-API-Key`
async fn require_api_key(
    State(state): State<Arc<LocationsState>>,
    request: Request,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !state.accepts_key(presented) {
        warn!(path = %request.uri().path(), "Rejected request with missing or invalid API key");
        return ApiError::unauthorized().into_response();
    }

    next.run(request).await
}

/// Record one driver location
///
/// POST /api/v1/locations
async fn create_location_handler(
    State(state): State<Arc<LocationsState>>,
    payload: std::result::Result<Json<CreateLocationRequest>, JsonRejection>,
) -> std::result::Result<Json<ApiResponse<CreateLocationData>>, ApiError> {
    let Json(req) = payload?;
    let point = parse_point(&req.location)?;

    let id = state.service.create_location(point).await?;

    Ok(Json(ApiResponse::ok(CreateLocationData {
        id,
        message: messages::LOCATION_CREATED.to_string(),
    })))
}

/// Record a batch of driver locations
///
/// POST /api/v1/locations/batch
async fn create_bulk_handler(
    State(state): State<Arc<LocationsState>>,
    payload: std::result::Result<Json<CreateLocationBulkRequest>, JsonRejection>,
) -> std::result::Result<Json<ApiResponse<BulkData>>, ApiError> {
    let Json(req) = payload?;

    // Shape errors here, range errors in the service
    let points = req
        .locations
        .iter()
        .enumerate()
        .map(|(index, item)| {
            LocationPoint::try_from(&item.location).map_err(|e| batch_item_error(index, e))
        })
        .collect::<Result<Vec<_>>>()?;

    let result = state.service.create_locations_bulk(&points).await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// Find driver locations within a radius, nearest first
///
/// POST /api/v1/locations/search
///
/// Zero matches is a 404 with an empty body.
async fn search_handler(
    State(state): State<Arc<LocationsState>>,
    payload: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> std::result::Result<Response, ApiError> {
    let Json(req) = payload?;
    let point = parse_point(&req.location)?;

    match state.service.search(point, req.radius).await? {
        SearchOutcome::Found(results) => {
            let locations: Vec<LocationHit> = results.into_iter().map(LocationHit::from).collect();
            let total = locations.len();
            Ok(Json(ApiResponse::ok(SearchData { locations, total })).into_response())
        }
        SearchOutcome::NoMatches => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

/// Import driver locations from a CSV body
///
/// POST /api/v1/locations/import
async fn import_handler(
    State(state): State<Arc<LocationsState>>,
    body: Bytes,
) -> std::result::Result<Json<ApiResponse<BulkData>>, ApiError> {
    let result = state.service.import_csv(body.as_ref()).await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// Store reachability
///
/// GET /health
async fn health_handler(State(state): State<Arc<LocationsState>>) -> impl IntoResponse {
    match state.service.health_check().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::ok())),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse::unavailable())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocationsConfig;
    use crate::locations::tests::{memory_service, FailingStore};
    use crate::locations::LocationService;
    use crate::store::memory::MemoryStore;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const KEY: &str = "test-key";

    fn create_test_state() -> (Arc<MemoryStore>, Arc<LocationsState>) {
        let (store, service) = memory_service();
        (store, Arc::new(LocationsState::new(service, KEY)))
    }

    fn failing_state() -> Arc<LocationsState> {
        let service = LocationService::new(
            Arc::new(FailingStore::default()),
            &LocationsConfig::default(),
        );
        Arc::new(LocationsState::new(service, KEY))
    }

    fn json_request(uri: &str, key: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_bytes(response: Response) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn point(lon: f64, lat: f64) -> Value {
        json!({"type": "Point", "coordinates": [lon, lat]})
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (_, state) = create_test_state();
        let response = create_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_health_reports_unavailable_store() {
        let response = create_router(failing_state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["status"], "unavailable");
    }

    #[tokio::test]
    async fn test_missing_or_wrong_key_is_unauthorized() {
        let (store, state) = create_test_state();
        let body = json!({"location": point(29.0, 41.0)});

        for key in [None, Some("wrong-key")] {
            let response = create_router(state.clone())
                .oneshot(json_request("/api/v1/locations", key, body.clone()))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let error = body_json(response).await;
            assert_eq!(error["success"], false);
            assert_eq!(error["error"], messages::UNAUTHORIZED);
        }

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_location() {
        let (store, state) = create_test_state();
        let response = create_router(state)
            .oneshot(json_request(
                "/api/v1/locations",
                Some(KEY),
                json!({"location": point(29.0, 41.0)}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["message"], messages::LOCATION_CREATED);
        assert!(!body["data"]["id"].as_str().unwrap().is_empty());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_points() {
        let (store, state) = create_test_state();

        let cases = [
            json!({"location": point(29.0, 91.0)}),
            json!({"location": {"type": "LineString", "coordinates": [29.0, 41.0]}}),
            json!({"location": {"type": "Point", "coordinates": [29.0]}}),
        ];
        for body in cases {
            let response = create_router(state.clone())
                .oneshot(json_request("/api/v1/locations", Some(KEY), body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await["code"], "INVALID_COORDINATES");
        }

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (_, state) = create_test_state();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/locations")
            .header(header::CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, KEY)
            .body(Body::from("{not json"))
            .unwrap();

        let response = create_router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn test_create_bulk() {
        let (store, state) = create_test_state();
        let body = json!({
            "locations": [
                {"location": point(29.0, 41.0)},
                {"location": point(29.1, 41.1)},
                {"location": point(29.2, 41.2)}
            ]
        });

        let response = create_router(state)
            .oneshot(json_request("/api/v1/locations/batch", Some(KEY), body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"], json!({"total": 3, "successful": 3, "failed": 0}));
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_create_bulk_rejects_empty_and_bad_items() {
        let (store, state) = create_test_state();

        let response = create_router(state.clone())
            .oneshot(json_request(
                "/api/v1/locations/batch",
                Some(KEY),
                json!({"locations": []}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_BATCH");

        let response = create_router(state)
            .oneshot(json_request(
                "/api/v1/locations/batch",
                Some(KEY),
                json!({"locations": [
                    {"location": point(29.0, 41.0)},
                    {"location": {"type": "Point", "coordinates": []}}
                ]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = body_json(response).await;
        assert!(error["error"].as_str().unwrap().contains("locations[1]"));

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_search_orders_by_distance() {
        let (_, state) = create_test_state();
        let far = state.service.create_location(LocationPoint::new(29.02, 41.0)).await.unwrap();
        let near = state.service.create_location(LocationPoint::new(29.001, 41.0)).await.unwrap();

        let response = create_router(state)
            .oneshot(json_request(
                SEARCH_PATH,
                Some(KEY),
                json!({"location": point(29.0, 41.0), "radius": 5000.0}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["total"], 2);
        assert_eq!(body["data"]["locations"][0]["id"], near.as_str());
        assert_eq!(body["data"]["locations"][1]["id"], far.as_str());
        assert_eq!(body["data"]["locations"][0]["location"]["type"], "Point");
    }

    #[tokio::test]
    async fn test_search_without_matches_is_empty_404() {
        let (_, state) = create_test_state();
        let response = create_router(state)
            .oneshot(json_request(
                SEARCH_PATH,
                Some(KEY),
                json!({"location": point(29.0, 41.0), "radius": 500.0}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_bad_radius() {
        let (_, state) = create_test_state();
        let response = create_router(state)
            .oneshot(json_request(
                SEARCH_PATH,
                Some(KEY),
                json!({"location": point(29.0, 41.0), "radius": 0.0}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_RADIUS");
    }

    #[tokio::test]
    async fn test_store_failure_is_generic_500() {
        let response = create_router(failing_state())
            .oneshot(json_request(
                SEARCH_PATH,
                Some(KEY),
                json!({"location": point(29.0, 41.0), "radius": 500.0}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], messages::INTERNAL_ERROR);
        assert!(!body.to_string().contains("db error"));
    }

    #[tokio::test]
    async fn test_import_csv() {
        let (store, state) = create_test_state();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/locations/import")
            .header(header::CONTENT_TYPE, "text/csv")
            .header(API_KEY_HEADER, KEY)
            .body(Body::from("latitude,longitude\n40.0,29.0\n41.0,30.0\n"))
            .unwrap();

        let response = create_router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["data"],
            json!({"total": 2, "successful": 2, "failed": 0})
        );
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_import_bad_row_names_line() {
        let (store, state) = create_test_state();
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/locations/import")
            .header(API_KEY_HEADER, KEY)
            .body(Body::from("latitude,longitude\n40.0,29.0\ninvalid,29.0\n"))
            .unwrap();

        let response = create_router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], "INVALID_CSV");
        assert!(body["error"].as_str().unwrap().contains("line 3"));
        assert!(store.is_empty().await);
    }
}
