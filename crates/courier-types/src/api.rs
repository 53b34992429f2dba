use serde::{Deserialize, Serialize};

// -- Response envelope --

/// Discriminator carried by every verification / bulk-send response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Warning,
    Error,
    Partial,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: Status,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self { status: Status::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { status: Status::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { status: Status::Error, message: message.into() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct AdminRegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UserRegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct UserRegisterResponse {
    pub message: String,
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UserLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPinQuery {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub correo: String,
    pub token: String,
}

// -- Clients --

#[derive(Debug, Deserialize)]
pub struct ClientPayload {
    pub name: String,
    #[serde(default)]
    pub rep_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct ClientResponse {
    pub id: i64,
    pub name: String,
    pub rep_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    pub created_at: String,
}

// -- Contacts / groups --

#[derive(Debug, Deserialize)]
pub struct ContactPayload {
    pub name: String,
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct GroupPayload {
    pub name: String,
    #[serde(default)]
    pub contact_ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

// -- Templates --

#[derive(Debug, Deserialize)]
pub struct TemplatePayload {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub id: i64,
    pub name: String,
    pub content: String,
    pub created_at: String,
}

// -- Documents --

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: i64,
    pub client_id: i64,
    pub file_name: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub file_name: String,
}

// -- WhatsApp sends --

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub phone_number_id: String,
    pub to: String,
    pub message: String,
    #[serde(default)]
    pub meta_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendTemplateRequest {
    pub phone_number_id: String,
    pub to: String,
    pub template_name: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub meta_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkTemplateRequest {
    pub phone_number_id: String,
    pub group_name: String,
    pub template_name: String,
    #[serde(default)]
    pub meta_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CampaignRequest {
    pub group_id: i64,
    pub template_id: i64,
    #[serde(default)]
    pub phone_number_id: Option<String>,
    #[serde(default)]
    pub meta_token: Option<String>,
}

/// Per-recipient failure inside a bulk send. The bulk operation itself
/// never fails because some recipients failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientError {
    pub phone_number: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BulkSendResponse {
    pub status: Status,
    pub message: String,
    pub errors: Vec<RecipientError>,
}

impl BulkSendResponse {
    /// Collapse an error accumulator into the partial-failure contract:
    /// empty list means full success, anything else means partial.
    pub fn from_errors(errors: Vec<RecipientError>) -> Self {
        if errors.is_empty() {
            Self {
                status: Status::Success,
                message: "Campaña enviada a todo el grupo correctamente.".into(),
                errors,
            }
        } else {
            Self {
                status: Status::Partial,
                message: "Algunos mensajes fallaron.".into(),
                errors,
            }
        }
    }
}

// -- Message history --

#[derive(Debug, Serialize)]
pub struct StoredMessage {
    pub phone_number: String,
    pub direction: String,
    pub content: String,
    pub message_type: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Status::Partial).unwrap(), "\"partial\"");
        assert_eq!(serde_json::to_string(&Status::Warning).unwrap(), "\"warning\"");
    }

    #[test]
    fn empty_error_list_is_success() {
        let resp = BulkSendResponse::from_errors(vec![]);
        assert_eq!(resp.status, Status::Success);
        assert!(resp.errors.is_empty());
    }

    #[test]
    fn nonempty_error_list_is_partial() {
        let resp = BulkSendResponse::from_errors(vec![RecipientError {
            phone_number: "50760000000".into(),
            error: "rejected".into(),
        }]);
        assert_eq!(resp.status, Status::Partial);
        assert_eq!(resp.errors.len(), 1);
    }
}
