use axum::{Json, extract::{Path, State}, response::IntoResponse};

use courier_types::api::{MessageResponse, TemplatePayload, TemplateResponse};

use crate::error::{ApiError, blocking};
use crate::state::AppState;

fn validate(payload: &TemplatePayload) -> Result<(), ApiError> {
    if payload.name.trim().is_empty() || payload.content.trim().is_empty() {
        return Err(ApiError::Validation(
            "El nombre y el contenido de la plantilla son obligatorios.".into(),
        ));
    }
    Ok(())
}

pub async fn create_template(
    State(state): State<AppState>,
    Json(payload): Json<TemplatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&payload)?;

    let db = state.clone();
    blocking(move || db.db.create_template(&payload.name, &payload.content)).await?;
    Ok(Json(MessageResponse::new("Plantilla creada exitosamente.")))
}

pub async fn list_templates(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.list_templates()).await?;
    let templates: Vec<TemplateResponse> = rows
        .into_iter()
        .map(|row| TemplateResponse {
            id: row.id,
            name: row.name,
            content: row.content,
            created_at: row.created_at,
        })
        .collect();
    Ok(Json(templates))
}

pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<TemplatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&payload)?;

    let db = state.clone();
    let affected = blocking(move || db.db.update_template(id, &payload.name, &payload.content)).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Plantilla no encontrada.".into()));
    }
    Ok(Json(MessageResponse::new("Plantilla actualizada correctamente.")))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let affected = blocking(move || db.db.delete_template(id)).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Plantilla no encontrada.".into()));
    }
    Ok(Json(MessageResponse::new("Plantilla eliminada correctamente.")))
}
