//! HTTP server for thumbnail endpoints
//!
//! Provides /health and /fill/{width}/{height}/{url}.

use crate::pipeline::Pipeline;
use crate::types::HealthResponse;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

/// Marks responses served from the disk cache
pub const CACHE_MARKER_HEADER: &str = "image-from-cache";

/// Shared state for the HTTP server
pub struct ServerState {
    pub pipeline: Pipeline,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/fill/{*rest}", get(fill))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until `shutdown` is cancelled
pub async fn start_server(
    state: SharedState,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let router = create_router(state);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache = state.pipeline.cache_stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache,
    })
}

/// Resize endpoint; the whole path is handed to the pipeline
async fn fill(State(state): State<SharedState>, uri: Uri, headers: HeaderMap) -> Response {
    match state.pipeline.process(uri.path(), &headers).await {
        Ok(thumbnail) => {
            let mut response = (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "image/jpeg")],
                thumbnail.bytes,
            )
                .into_response();
            if thumbnail.from_cache {
                response
                    .headers_mut()
                    .insert(
                        HeaderName::from_static(CACHE_MARKER_HEADER),
                        HeaderValue::from_static("1"),
                    );
            }
            response
        }
        Err(e) => {
            if e.status_code().is_server_error() {
                error!(path = %uri.path(), error = %e, "Thumbnail request failed");
            } else {
                warn!(path = %uri.path(), error = %e, "Thumbnail request rejected");
            }
            e.into_response()
        }
    }
}
