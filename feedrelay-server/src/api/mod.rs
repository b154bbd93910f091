//! HTTP API handlers.
//!
//! # Endpoints
//!
//! - `GET /api/feed?url=...`                – register a feed, return its keys
//! - `GET /api/search?query=...`            – search registered feed URLs
//! - `GET /.well-known/nostr.json?name=...` – NIP-05 names

use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use feedrelay_core::store::StoreError;

use crate::state::AppState;

mod feed;
mod nip05;

/// Build the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/feed", get(feed::register_feed))
        .route("/api/search", get(feed::search_feeds))
        .route("/.well-known/nostr.json", get(nip05::nip05))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in API handlers.
#[derive(Debug)]
pub(crate) enum ApiError {
    /// The registration store failed.
    Store(StoreError),
    /// The request cannot be served as asked.
    BadRequest(String),
    /// Key material could not be derived or encoded.
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Store(e) => {
                tracing::error!(error = %e, "API store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "API internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
