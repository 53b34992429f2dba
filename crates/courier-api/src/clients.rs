//! Client (customer account) CRUD. Thin passthrough to the store.

use axum::{Json, extract::{Path, State}, response::IntoResponse};

use courier_db::models::ClientRow;
use courier_types::api::{ClientPayload, ClientResponse, MessageResponse};

use crate::error::{ApiError, blocking};
use crate::state::AppState;

fn to_response(row: ClientRow) -> ClientResponse {
    ClientResponse {
        id: row.id,
        name: row.name,
        rep_name: row.rep_name,
        email: row.email,
        phone: row.phone,
        address: row.address,
        active: row.active,
        created_at: row.created_at,
    }
}

fn validate(payload: &ClientPayload) -> Result<(), ApiError> {
    if payload.name.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(ApiError::Validation("Nombre y Correo son obligatorios.".into()));
    }
    Ok(())
}

pub async fn create_client(
    State(state): State<AppState>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&payload)?;

    let db = state.clone();
    blocking(move || {
        db.db.create_client(
            &payload.name,
            payload.rep_name.as_deref(),
            &payload.email,
            payload.phone.as_deref(),
            payload.address.as_deref(),
            payload.active,
        )
    })
    .await?;

    Ok(Json(MessageResponse::new("Cliente creado correctamente.")))
}

pub async fn list_clients(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.list_clients()).await?;
    Ok(Json(rows.into_iter().map(to_response).collect::<Vec<_>>()))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let row = blocking(move || db.db.get_client(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Cliente no encontrado.".into()))?;
    Ok(Json(to_response(row)))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&payload)?;

    let db = state.clone();
    let affected = blocking(move || {
        db.db.update_client(
            id,
            &payload.name,
            payload.rep_name.as_deref(),
            &payload.email,
            payload.phone.as_deref(),
            payload.address.as_deref(),
            payload.active,
        )
    })
    .await?;

    if affected == 0 {
        return Err(ApiError::NotFound("Cliente no encontrado.".into()));
    }
    Ok(Json(MessageResponse::new("Cliente actualizado correctamente.")))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let affected = blocking(move || db.db.delete_client(id)).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Cliente no encontrado.".into()));
    }
    Ok(Json(MessageResponse::new("Cliente eliminado correctamente.")))
}
