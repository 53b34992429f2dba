use std::path::PathBuf;
use std::sync::Arc;

use courier_db::Database;
use courier_gateway::{GatewayClient, LanguageMap};
use courier_mailer::Mailer;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub mailer: Mailer,
    pub gateway: GatewayClient,
    pub settings: Settings,
}

/// Request-handling settings sourced from process configuration.
pub struct Settings {
    /// Default bearer token for the messaging gateway; requests may
    /// override it per call.
    pub meta_token: String,
    /// Default sender phone-number id for campaign sends.
    pub phone_number_id: String,
    /// Shared secret for the webhook verification handshake.
    pub webhook_verify_token: String,
    /// Prefix for account-verification links sent by email.
    pub base_frontend_url: String,
    pub uploads_dir: PathBuf,
    pub languages: LanguageMap,
}
