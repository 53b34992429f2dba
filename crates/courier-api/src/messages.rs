//! Outbound WhatsApp sends and conversation history.
//!
//! Dispatch and logging are not atomic: a Message row is written only
//! after the gateway confirms the send, so a rejected dispatch leaves
//! no log row. Bulk sends aggregate per-recipient failures instead of
//! failing wholesale.

use axum::{Json, extract::{Path, State}, response::IntoResponse};
use tracing::warn;

use courier_db::models::GroupMemberRow;
use courier_gateway::templating::{display_name, has_placeholder, personalize};
use courier_gateway::{GatewayError, OutboundMessage};
use courier_types::api::{
    BulkSendResponse, BulkTemplateRequest, MessageResponse, RecipientError, SendMessageRequest,
    SendTemplateRequest, StoredMessage,
};

use crate::error::{ApiError, blocking};
use crate::state::AppState;

fn resolve_meta_token(state: &AppState, provided: Option<&str>) -> Result<String, ApiError> {
    let token = provided
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(&state.settings.meta_token);
    if token.trim().is_empty() {
        return Err(ApiError::Validation("Missing META token".into()));
    }
    Ok(token.to_string())
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.to.trim().is_empty() || req.message.trim().is_empty() {
        return Err(ApiError::Validation(
            "El número y el mensaje son obligatorios.".into(),
        ));
    }
    let token = resolve_meta_token(&state, req.meta_token.as_deref())?;

    let payload = OutboundMessage::text(req.to.clone(), req.message.clone());
    state
        .gateway
        .send(&req.phone_number_id, &token, &payload)
        .await?;

    let db = state.clone();
    blocking(move || db.db.insert_message(&req.to, "outbound", &req.message, "text")).await?;

    Ok(Json(MessageResponse::new("Mensaje enviado correctamente.")))
}

pub async fn send_template_message(
    State(state): State<AppState>,
    Json(req): Json<SendTemplateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.to.trim().is_empty() || req.template_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "El número y la plantilla son obligatorios.".into(),
        ));
    }
    let token = resolve_meta_token(&state, req.meta_token.as_deref())?;

    let name = req.template_name.clone();
    let db = state.clone();
    let content = blocking(move || db.db.get_template_content_by_name(&name))
        .await?
        .ok_or_else(|| ApiError::NotFound("Plantilla no encontrada.".into()))?;

    let locale = state.settings.languages.resolve(&req.template_name);
    let personalized = personalize(&content, req.user_name.as_deref());

    let mut payload = OutboundMessage::template(req.to.clone(), &req.template_name, locale);
    if has_placeholder(&content) {
        payload = payload.with_body_parameter(display_name(req.user_name.as_deref()));
    }

    state
        .gateway
        .send(&req.phone_number_id, &token, &payload)
        .await?;

    // Log the personalized text, not the raw template.
    let db = state.clone();
    blocking(move || db.db.insert_message(&req.to, "outbound", &personalized, "template")).await?;

    Ok(Json(MessageResponse::new("Plantilla enviada correctamente.")))
}

pub async fn send_bulk_template(
    State(state): State<AppState>,
    Json(req): Json<BulkTemplateRequest>,
) -> Result<Json<BulkSendResponse>, ApiError> {
    if req.group_name.trim().is_empty() || req.template_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "El grupo y la plantilla son obligatorios.".into(),
        ));
    }
    let token = resolve_meta_token(&state, req.meta_token.as_deref())?;

    // Template resolution fails fast, before touching any recipient.
    let name = req.template_name.clone();
    let db = state.clone();
    let content = blocking(move || db.db.get_template_content_by_name(&name))
        .await?
        .ok_or_else(|| ApiError::NotFound("Plantilla no encontrada.".into()))?;

    let group = req.group_name.clone();
    let db = state.clone();
    let members = blocking(move || db.db.get_group_members_by_name(&group)).await?;

    let locale = state.settings.languages.resolve(&req.template_name).to_string();
    let prepared = PreparedTemplate {
        name: &req.template_name,
        content: &content,
        locale: &locale,
    };

    // The closure owns its captures: borrowing them from the handler
    // trips rustc's auto-trait check for higher-ranked lifetimes
    // ("implementation of `Send` is not general enough").
    let gateway_state = state.clone();
    let phone_number_id = req.phone_number_id.clone();
    let (delivered, errors) = dispatch_bulk(&members, &prepared, async move |_member, payload| {
        gateway_state
            .gateway
            .send(&phone_number_id, &token, &payload)
            .await
    })
    .await;

    let db = state.clone();
    blocking(move || {
        for (phone, personalized) in &delivered {
            db.db.insert_message(phone, "outbound", personalized, "template")?;
        }
        Ok(())
    })
    .await?;

    Ok(Json(BulkSendResponse::from_errors(errors)))
}

pub(crate) struct PreparedTemplate<'a> {
    pub name: &'a str,
    pub content: &'a str,
    pub locale: &'a str,
}

/// Per-recipient dispatch loop. One recipient's failure never blocks
/// the rest; an empty member list is a no-op. Returns the delivered
/// `(phone, personalized content)` pairs and the error accumulator.
pub(crate) async fn dispatch_bulk<S>(
    members: &[GroupMemberRow],
    template: &PreparedTemplate<'_>,
    mut send: S,
) -> (Vec<(String, String)>, Vec<RecipientError>)
where
    S: AsyncFnMut(&GroupMemberRow, OutboundMessage) -> Result<(), GatewayError>,
{
    let templated = has_placeholder(template.content);
    let mut delivered = Vec::new();
    let mut errors = Vec::new();

    for member in members {
        let personalized = personalize(template.content, Some(&member.name));

        let mut payload =
            OutboundMessage::template(member.phone_number.clone(), template.name, template.locale);
        if templated {
            payload = payload.with_body_parameter(display_name(Some(&member.name)));
        }

        match send(member, payload).await {
            Ok(()) => delivered.push((member.phone_number.clone(), personalized)),
            Err(err) => {
                warn!(phone = %member.phone_number, error = %err, "bulk recipient failed");
                errors.push(RecipientError {
                    phone_number: member.phone_number.clone(),
                    error: gateway_error_body(&err),
                });
            }
        }
    }

    (delivered, errors)
}

/// The gateway's rejection body travels verbatim; transport errors
/// collapse to their message.
pub(crate) fn gateway_error_body(err: &GatewayError) -> String {
    match err {
        GatewayError::Rejected { body, .. } => body.clone(),
        other => other.to_string(),
    }
}

// -- Conversation history --

pub async fn list_conversations(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let numbers = blocking(move || db.db.list_conversations()).await?;
    Ok(Json(numbers))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.get_messages_for_number(&number)).await?;
    let messages: Vec<StoredMessage> = rows
        .into_iter()
        .map(|row| StoredMessage {
            phone_number: row.phone_number,
            direction: row.direction,
            content: row.content,
            message_type: row.message_type,
            created_at: row.created_at,
        })
        .collect();
    Ok(Json(messages))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(phones: &[&str]) -> Vec<GroupMemberRow> {
        phones
            .iter()
            .enumerate()
            .map(|(i, phone)| GroupMemberRow {
                name: format!("Contacto {i}"),
                phone_number: phone.to_string(),
            })
            .collect()
    }

    const TEMPLATE: PreparedTemplate<'static> = PreparedTemplate {
        name: "inicio_de_conversacion",
        content: "Hola {{Name}}, bienvenido.",
        locale: "es_PAN",
    };

    #[tokio::test]
    async fn empty_group_is_a_successful_no_op() {
        let (delivered, errors) =
            dispatch_bulk(&[], &TEMPLATE, async |_, _| Ok(())).await;
        assert!(delivered.is_empty());
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn failures_accumulate_without_short_circuiting() {
        let group = members(&["111", "222", "333", "444"]);

        // Recipients 222 and 444 fail; the rest must still go out.
        let (delivered, errors) = dispatch_bulk(&group, &TEMPLATE, async |member, _| {
            if member.phone_number == "222" || member.phone_number == "444" {
                Err(GatewayError::Rejected {
                    status: 400,
                    body: format!("rejected {}", member.phone_number),
                })
            } else {
                Ok(())
            }
        })
        .await;

        assert_eq!(delivered.len(), 2);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].phone_number, "222");
        assert_eq!(errors[0].error, "rejected 222");
        assert_eq!(errors[1].phone_number, "444");
    }

    #[tokio::test]
    async fn recipients_keep_query_order_and_personalization() {
        let group = vec![
            GroupMemberRow { name: "Ana".into(), phone_number: "111".into() },
            GroupMemberRow { name: "".into(), phone_number: "222".into() },
        ];

        let (delivered, errors) = dispatch_bulk(&group, &TEMPLATE, async |_, _| Ok(())).await;

        assert!(errors.is_empty());
        assert_eq!(delivered[0], ("111".into(), "Hola Ana, bienvenido.".into()));
        // Blank contact name falls back to the default label.
        assert_eq!(delivered[1], ("222".into(), "Hola Cliente, bienvenido.".into()));
    }

    #[test]
    fn rejection_body_reaches_recipients_verbatim() {
        let err = GatewayError::Rejected {
            status: 400,
            body: r#"{"error":{"code":131026}}"#.into(),
        };
        // No display prefix on top of the gateway's own body.
        assert_eq!(gateway_error_body(&err), r#"{"error":{"code":131026}}"#);
    }

    #[tokio::test]
    async fn all_failures_still_return_full_accumulator() {
        let group = members(&["111", "222"]);
        let (delivered, errors) = dispatch_bulk(&group, &TEMPLATE, async |_, _| {
            Err(GatewayError::Rejected { status: 500, body: "down".into() })
        })
        .await;
        assert!(delivered.is_empty());
        assert_eq!(errors.len(), 2);
    }
}
