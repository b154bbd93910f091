//! Axum server setup and router configuration.

use crate::api;
use crate::relay::handle_socket;
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::{
    Json, Router,
    extract::{
        State,
        ws::{WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::{HeaderMap, header::ACCEPT},
    response::{IntoResponse, Response},
    routing::get,
};
use feedrelay_sdk::objects::RelayInformation;
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;

const NOSTR_JSON: &str = "application/nostr+json";

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Relay websocket and NIP-11 document
        .route("/", get(relay_root))
        // Health check endpoint
        .route("/health", get(health_check))
        .merge(api::router())
        // Add state to all routes
        .with_state(state)
}

/// `GET /`: websocket upgrade for relay clients, NIP-11 otherwise.
async fn relay_root(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if let Ok(ws) = ws {
        return ws.on_upgrade(move |socket| handle_socket(socket, state));
    }

    let wants_info = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains(NOSTR_JSON));
    if !wants_info {
        return "feedrelay: connect with a nostr client to read feeds as notes".into_response();
    }

    let info = relay_information(&state).await;
    ([(axum::http::header::CONTENT_TYPE, NOSTR_JSON)], Json(info)).into_response()
}

async fn relay_information(state: &AppState) -> RelayInformation {
    let settings = state.settings().await;
    RelayInformation {
        name: "feedrelay".to_string(),
        description: "Relay that turns RSS, Atom and JSON feeds into nostr profiles and notes"
            .to_string(),
        pubkey: Some(settings.owner_public_key.clone()).filter(|key| !key.is_empty()),
        contact: None,
        supported_nips: vec![1, 5, 11],
        software: "feedrelay".to_string(),
        version: settings.version.clone(),
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Simple health check - returns OK if the server is running.
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
