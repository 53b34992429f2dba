use axum::{Json, extract::State, response::IntoResponse};

use courier_types::api::{ContactPayload, ContactResponse, MessageResponse};

use crate::error::{ApiError, blocking};
use crate::state::AppState;

pub async fn create_contact(
    State(state): State<AppState>,
    Json(payload): Json<ContactPayload>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty() || payload.phone_number.trim().is_empty() {
        return Err(ApiError::Validation(
            "El nombre y el número de teléfono son obligatorios.".into(),
        ));
    }

    let db = state.clone();
    blocking(move || db.db.create_contact(&payload.name, &payload.phone_number)).await?;
    Ok(Json(MessageResponse::new("Contacto creado exitosamente.")))
}

pub async fn list_contacts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.list_contacts()).await?;
    let contacts: Vec<ContactResponse> = rows
        .into_iter()
        .map(|row| ContactResponse {
            id: row.id,
            name: row.name,
            phone_number: row.phone_number,
            created_at: row.created_at,
        })
        .collect();
    Ok(Json(contacts))
}
