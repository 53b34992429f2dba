use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use courier_gateway::GatewayError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error taxonomy for every request handler. Each variant maps to one
/// HTTP status; internals are logged here and never leak past a
/// message string.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// The messaging gateway rejected a dispatch; its response body is
    /// surfaced verbatim.
    #[error("{0}")]
    Gateway(String),
    /// Transport-level failure talking to the gateway.
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected { body, .. } => ApiError::Gateway(body),
            GatewayError::Transport(e) => ApiError::Delivery(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
            ApiError::Gateway(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Delivery(m) => {
                error!("gateway delivery failure: {}", m);
                (StatusCode::BAD_GATEWAY, "Error al enviar el mensaje.".to_string())
            }
            ApiError::Internal(e) => {
                error!("internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Error interno del servidor.".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Run blocking database work off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("blocking task join error: {e}")))?
        .map_err(ApiError::Internal)
}
