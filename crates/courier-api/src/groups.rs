use axum::{Json, extract::State, response::IntoResponse};

use courier_types::api::{GroupPayload, GroupResponse, MessageResponse};

use crate::error::{ApiError, blocking};
use crate::state::AppState;

pub async fn create_group(
    State(state): State<AppState>,
    Json(payload): Json<GroupPayload>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() || payload.contact_ids.is_empty() {
        return Err(ApiError::Validation(
            "El nombre del grupo y al menos un contacto son obligatorios.".into(),
        ));
    }

    let db = state.clone();
    blocking(move || db.db.create_group_with_contacts(&payload.name, &payload.contact_ids)).await?;
    Ok(Json(MessageResponse::new(
        "Grupo creado correctamente con sus contactos asociados.",
    )))
}

pub async fn list_groups(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.list_groups()).await?;
    let groups: Vec<GroupResponse> = rows
        .into_iter()
        .map(|row| GroupResponse {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        })
        .collect();
    Ok(Json(groups))
}
