//! Inbound webhook surface for the messaging gateway.

use axum::{Json, extract::{Query, State}, http::StatusCode, response::IntoResponse};
use serde_json::Value;
use tracing::{debug, info};

use courier_types::api::MessageResponse;
use courier_types::webhook::{VerifyQuery, extract_inbound_text};

use crate::error::{ApiError, blocking};
use crate::state::AppState;

/// Meta's subscription handshake: echo the challenge as plain text when
/// the mode and the shared secret match, otherwise forbid.
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<String, StatusCode> {
    if query.mode == "subscribe" && query.verify_token == state.settings.webhook_verify_token {
        Ok(query.challenge)
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

/// Message delivery. Status-only callbacks (no `messages` array) and
/// non-text payloads are acknowledged without writing anything.
pub async fn receive_webhook(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(inbound) = extract_inbound_text(&body) else {
        debug!("webhook delivery without a text message; ignoring");
        return Ok(Json(MessageResponse::new("ok")));
    };

    info!(from = %inbound.from, "inbound message received");

    let db = state.clone();
    blocking(move || db.db.insert_message(&inbound.from, "inbound", &inbound.body, "text")).await?;

    Ok(Json(MessageResponse::new("Mensaje recibido.")))
}
