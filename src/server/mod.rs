//! HTTP servers for the location and matching services
//!
//! Both services share the error envelope defined here and the same
//! lifecycle: bind, serve until SIGINT/SIGTERM, then give in-flight
//! requests `shutdown_timeout_secs` to finish.

pub mod locations;
pub mod matching;
pub mod state;

use crate::config::Config;
use crate::constants::messages;
use crate::error::{Error, Result};
use crate::locations::LocationService;
use crate::matching::client::RemoteLocationClient;
use crate::matching::MatchResolver;
use crate::store::open_store;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use state::{LocationsState, MatchingState};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, code: &str) -> Self {
        Self {
            status,
            success: false,
            error: error.into(),
            code: code.to_string(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, messages::UNAUTHORIZED, "UNAUTHORIZED")
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, messages::NOT_FOUND, "NOT_FOUND")
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            messages::INTERNAL_ERROR,
            "INTERNAL_ERROR",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if !err.is_validation() {
            // Details stay in the logs
            error!(error = %err, "Request failed");
            return ApiError::internal();
        }

        let code = match &err {
            Error::InvalidCoordinates(_) => "INVALID_COORDINATES",
            Error::InvalidRadius(_) => "INVALID_RADIUS",
            Error::InvalidBatch(_) => "INVALID_BATCH",
            Error::Parse { .. } => "INVALID_CSV",
            _ => "INVALID_REQUEST",
        };
        ApiError::new(StatusCode::BAD_REQUEST, err.to_string(), code)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text(), "INVALID_BODY")
    }
}

/// Start the location service
///
/// Connects the configured store first; a failed connection or index
/// creation aborts startup.
pub async fn run_locations(config: &Config) -> Result<()> {
    config.validate_for_locations()?;
    let addr = parse_addr(&config.locations_addr())?;

    let store = open_store(config).await?;

    let service = LocationService::new(store, &config.locations);
    let state = Arc::new(LocationsState::new(service, config.locations.api_key.clone()));
    let app = locations::create_router(state);

    serve(addr, app, "location", shutdown_timeout(config)).await
}

/// Start the matching service
pub async fn run_matching(config: &Config) -> Result<()> {
    config.validate_for_matching()?;
    let addr = parse_addr(&config.matching_addr())?;

    let client = RemoteLocationClient::from_config(&config.matching)?;
    info!(
        location_service = client.search_url(),
        radius = config.matching.search_radius_meters,
        "Matching against remote location service"
    );

    let resolver = MatchResolver::new(Arc::new(client), &config.matching);
    let state = Arc::new(MatchingState::new(resolver));
    let app = matching::create_router(state);

    serve(addr, app, "matching", shutdown_timeout(config)).await
}

fn parse_addr(addr: &str) -> Result<SocketAddr> {
    addr.parse()
        .map_err(|e| Error::Server(format!("Invalid server address {}: {}", addr, e)))
}

fn shutdown_timeout(config: &Config) -> Duration {
    Duration::from_secs(config.server.shutdown_timeout_secs)
}

async fn serve(addr: SocketAddr, app: Router, name: &str, drain: Duration) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Server(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Starting {} service on {}", name, addr);

    serve_until(listener, app, shutdown_signal(), drain).await?;

    info!("{} service stopped", name);
    Ok(())
}

/// Serve `app` until `signal` resolves, then drain for at most `drain`
///
/// Requests still running when the window closes are dropped.
pub async fn serve_until<S>(listener: TcpListener, app: Router, signal: S, drain: Duration) -> Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let (stopping_tx, stopping_rx) = oneshot::channel::<()>();

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.await;
                let _ = stopping_tx.send(());
            })
            .await
    });

    tokio::select! {
        finished = &mut server => return join_result(finished),
        _ = stopping_rx => {}
    }

    info!(timeout = ?drain, "Shutdown requested, draining in-flight requests");
    let abort = server.abort_handle();
    match tokio::time::timeout(drain, server).await {
        Ok(finished) => join_result(finished),
        Err(_) => {
            warn!("Shutdown timeout elapsed; dropping in-flight requests");
            abort.abort();
            Ok(())
        }
    }
}

fn join_result(
    finished: std::result::Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    match finished {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Error::Server(format!("Server error: {}", e))),
        Err(e) => Err(Error::Server(format!("Server task failed: {}", e))),
    }
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[test]
    fn test_validation_errors_are_bad_requests() {
        let err = ApiError::from(Error::InvalidRadius("must be positive".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "INVALID_RADIUS");
        assert!(err.error.contains("must be positive"));
        assert!(!err.success);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ApiError::from(Error::Store("connection reset by peer".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error, messages::INTERNAL_ERROR);

        let err = ApiError::from(Error::Transport("timeout".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_serve_until_stops_on_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/health", get(|| async { "ok" }));

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve_until(
            listener,
            app,
            async move {
                let _ = rx.await;
            },
            Duration::from_secs(1),
        ));

        let body = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "ok");

        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_drain_window_drops_slow_requests() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "done"
            }),
        );

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve_until(
            listener,
            app,
            async move {
                let _ = rx.await;
            },
            Duration::from_millis(200),
        ));

        let slow = tokio::spawn(reqwest::get(format!("http://{}/slow", addr)));
        tokio::time::sleep(Duration::from_millis(100)).await;

        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
        slow.abort();
    }
}
