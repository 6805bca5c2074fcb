//! # Device-Facing Loopback Server
//!
//! The wearable's HTTP client fetches tiles from the phone over loopback.
//! This module owns that surface: the tile endpoint itself plus the two
//! small control endpoints the device uses to repoint the tile source, and
//! a liveness probe.
//!
//! The server is an explicitly constructed, explicitly owned instance — no
//! lazily initialized global. Callers build the state, hand in a shutdown
//! future, and the listening socket is released when it resolves.
//!
//! One quirk the handlers must respect: the device HTTP client rejects
//! empty response bodies outright, so even error responses carry a
//! non-empty JSON body.

use crate::colour::ColourPalette;
use crate::pipeline::{transcode, TileRequest, TileSource};
use crate::tile::TileEncoding;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared request-handling state.
///
/// The codec side is immutable — encoding and palette are fixed when the
/// state is built, per-call configuration rather than process-wide
/// mutables. The tile source is the one component with runtime-swappable
/// innards (endpoint and token), guarded inside the source itself.
pub struct AppState<S> {
    pub source: S,
    pub encoding: TileEncoding,
    pub palette: ColourPalette,
}

/// Build the device-facing router over the given state.
pub fn router<S: TileSource + 'static>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/tile", post(tile_handler::<S>))
        .route("/tileServer", post(tile_server_handler::<S>))
        .route("/authToken", post(auth_token_handler::<S>))
        .route("/status", get(status_handler))
        .with_state(state)
}

/// Bind the loopback listener and serve until `shutdown` resolves.
pub async fn serve<S: TileSource + 'static>(
    state: Arc<AppState<S>>,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "device tile server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// POST /tile — the device requests one sub-tile.
///
/// The body is parsed by hand rather than through the `Json` extractor so
/// a malformed request gets a 400 with a real JSON error body instead of
/// the framework's plain-text rejection.
async fn tile_handler<S: TileSource>(
    State(state): State<Arc<AppState<S>>>,
    body: String,
) -> Response {
    let request: TileRequest = match serde_json::from_str(&body) {
        Ok(request) => request,
        Err(error) => {
            warn!(%error, "malformed tile request");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response();
        }
    };
    let response = transcode(&state.source, &request, state.encoding, &state.palette).await;
    Json(response).into_response()
}

/// POST /tileServer — plain string body with the new URL template.
async fn tile_server_handler<S: TileSource>(
    State(state): State<Arc<AppState<S>>>,
    body: String,
) -> Json<serde_json::Value> {
    info!(endpoint = %body, "tile server changed");
    state.source.replace_endpoint(body);
    Json(json!({}))
}

/// POST /authToken — plain string body with the new bearer token; an
/// empty body clears it.
async fn auth_token_handler<S: TileSource>(
    State(state): State<Arc<AppState<S>>>,
    body: String,
) -> Json<serde_json::Value> {
    let token = if body.is_empty() { None } else { Some(body) };
    info!(present = token.is_some(), "auth token changed");
    state.source.replace_token(token);
    Json(json!({}))
}

/// GET /status — liveness probe with a non-empty body.
async fn status_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
