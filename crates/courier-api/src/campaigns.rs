//! Campaign sends addressed by group id + template id. The template
//! content goes out as plain text to every phone in the group, with the
//! same per-recipient failure aggregation as the bulk template path,
//! and the campaign itself is recorded.

use axum::{Json, extract::State};
use tracing::warn;

use courier_gateway::OutboundMessage;
use courier_types::api::{BulkSendResponse, CampaignRequest, RecipientError};

use crate::error::{ApiError, blocking};
use crate::messages::gateway_error_body;
use crate::state::AppState;

pub async fn send_campaign(
    State(state): State<AppState>,
    Json(req): Json<CampaignRequest>,
) -> Result<Json<BulkSendResponse>, ApiError> {
    if req.group_id <= 0 || req.template_id <= 0 {
        return Err(ApiError::Validation(
            "El ID del grupo y el ID de la plantilla son obligatorios.".into(),
        ));
    }

    let phone_number_id = req
        .phone_number_id
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(&state.settings.phone_number_id)
        .to_string();
    if phone_number_id.is_empty() {
        return Err(ApiError::Validation("Missing phone number id".into()));
    }
    let token = req
        .meta_token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(&state.settings.meta_token)
        .to_string();
    if token.is_empty() {
        return Err(ApiError::Validation("Missing META token".into()));
    }

    let db = state.clone();
    let template_id = req.template_id;
    let content = blocking(move || db.db.get_template_content_by_id(template_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Plantilla no encontrada.".into()))?;

    let db = state.clone();
    let group_id = req.group_id;
    let phones = blocking(move || db.db.get_group_phones_by_id(group_id)).await?;
    if phones.is_empty() {
        return Err(ApiError::NotFound("El grupo no tiene contactos asociados.".into()));
    }

    let mut delivered = Vec::new();
    let mut errors = Vec::new();
    for phone in phones {
        let payload = OutboundMessage::text(phone.clone(), content.clone());
        match state.gateway.send(&phone_number_id, &token, &payload).await {
            Ok(()) => delivered.push(phone),
            Err(err) => {
                warn!(phone = %phone, error = %err, "campaign recipient failed");
                errors.push(RecipientError {
                    phone_number: phone,
                    error: gateway_error_body(&err),
                });
            }
        }
    }

    let db = state.clone();
    blocking(move || {
        for phone in &delivered {
            db.db.insert_message(phone, "outbound", &content, "text")?;
        }
        db.db.insert_campaign(req.group_id, req.template_id)?;
        Ok(())
    })
    .await?;

    Ok(Json(BulkSendResponse::from_errors(errors)))
}
