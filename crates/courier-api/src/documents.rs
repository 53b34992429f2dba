//! PDF document storage per client: raw bytes in an uploads directory,
//! metadata row in the store.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use courier_types::api::{DocumentResponse, MessageResponse, UploadResponse};

use crate::error::{ApiError, blocking};
use crate::state::AppState;

/// 20 MB upload limit for documents.
const MAX_DOCUMENT_SIZE: usize = 20 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub file_name: Option<String>,
}

pub async fn upload_document(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
    Query(query): Query<UploadQuery>,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::Validation("No se proporcionó un archivo válido.".into()));
    }
    if bytes.len() > MAX_DOCUMENT_SIZE {
        return Err(ApiError::Validation("El archivo excede el tamaño permitido.".into()));
    }
    // Only PDFs are accepted.
    if !bytes.starts_with(b"%PDF") {
        return Err(ApiError::Validation("Solo se permiten archivos PDF.".into()));
    }

    let db = state.clone();
    let exists = blocking(move || db.db.get_client(client_id)).await?.is_some();
    if !exists {
        return Err(ApiError::NotFound("Cliente no encontrado.".into()));
    }

    let file_name = query
        .file_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "documento.pdf".to_string());
    let stored_name = format!("{}.pdf", Uuid::new_v4());
    let stored_path = state.settings.uploads_dir.join(&stored_name);

    tokio::fs::create_dir_all(&state.settings.uploads_dir)
        .await
        .map_err(|e| {
            error!("failed to create uploads directory: {}", e);
            ApiError::Internal(e.into())
        })?;
    tokio::fs::write(&stored_path, &bytes).await.map_err(|e| {
        error!("failed to write {}: {}", stored_path.display(), e);
        ApiError::Internal(e.into())
    })?;

    let db = state.clone();
    let path_str = stored_path.to_string_lossy().into_owned();
    let name_db = file_name.clone();
    blocking(move || db.db.insert_document(client_id, &name_db, &path_str)).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Documento subido correctamente.".into(),
            file_name,
        }),
    ))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || db.db.list_documents_for_client(client_id)).await?;
    let documents: Vec<DocumentResponse> = rows
        .into_iter()
        .map(|row| DocumentResponse {
            id: row.id,
            client_id: row.client_id,
            file_name: row.file_name,
            created_at: row.created_at,
        })
        .collect();
    Ok(Json(documents))
}

pub async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let document = blocking(move || db.db.get_document(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Documento no encontrado.".into()))?;

    let bytes = tokio::fs::read(&document.stored_path).await.map_err(|e| {
        error!("failed to read {}: {}", document.stored_path, e);
        ApiError::NotFound("El archivo no existe en el servidor.".into())
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", document.file_name),
            ),
        ],
        bytes,
    ))
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let document = blocking(move || db.db.get_document(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Documento no encontrado.".into()))?;

    if let Err(e) = tokio::fs::remove_file(&document.stored_path).await {
        // Missing file on disk is not fatal; the row still goes away.
        error!("failed to remove {}: {}", document.stored_path, e);
    }

    let db = state.clone();
    blocking(move || db.db.delete_document(id)).await?;
    Ok(Json(MessageResponse::new("Documento eliminado correctamente.")))
}
