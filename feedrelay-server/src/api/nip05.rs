use axum::{
    Json,
    extract::{Query, State},
};
use feedrelay_sdk::objects::{Nip05Query, Nip05Response};

use super::ApiError;
use crate::state::AppState;

/// `GET /.well-known/nostr.json?name=...`: NIP-05 lookup.
///
/// `_` (and a missing name) resolves to the relay owner. When automatic
/// registration is enabled, any other name resolves to the first feed whose
/// URL contains it; unknown names fall back to the owner document.
pub async fn nip05(
    State(state): State<AppState>,
    Query(query): Query<Nip05Query>,
) -> Result<Json<Nip05Response>, ApiError> {
    let settings = state.settings().await;
    let name = query.name.unwrap_or_default();

    if !name.is_empty() && name != "_" && settings.enable_auto_nip05_registration {
        if let Some(registration) = state.store.search_by_url(&name, 1).await?.into_iter().next() {
            return Ok(Json(Nip05Response::single(name, registration.public_key)));
        }
    }

    Ok(Json(Nip05Response::single("_", settings.owner_public_key.clone())))
}
