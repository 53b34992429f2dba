use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{delete, get, post, put},
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use courier_api::state::{AppState, AppStateInner, Settings};
use courier_api::{auth, campaigns, clients, contacts, documents, groups, messages, templates, webhook};
use courier_gateway::{GatewayClient, LanguageMap};
use courier_mailer::{Mailer, SmtpConfig};

struct Config {
    host: String,
    port: u16,
    db_path: String,
    smtp: SmtpConfig,
    meta_token: String,
    phone_number_id: String,
    webhook_verify_token: String,
    base_frontend_url: String,
    uploads_dir: PathBuf,
}

impl Config {
    fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env_or("COURIER_HOST", "0.0.0.0"),
            port: env_or("COURIER_PORT", "3000").parse()?,
            db_path: env_or("COURIER_DB_PATH", "courier.db"),
            smtp: SmtpConfig {
                host: env_or("COURIER_SMTP_HOST", "smtp.gmail.com"),
                port: env_or("COURIER_SMTP_PORT", "587").parse()?,
                username: env_or("COURIER_SMTP_USERNAME", ""),
                password: env_or("COURIER_SMTP_PASSWORD", ""),
                from_name: env_or("COURIER_SMTP_FROM_NAME", "Courier"),
            },
            meta_token: env_or("COURIER_META_TOKEN", ""),
            phone_number_id: env_or("COURIER_PHONE_NUMBER_ID", ""),
            webhook_verify_token: env_or("COURIER_WEBHOOK_VERIFY_TOKEN", "dev-verify-token"),
            base_frontend_url: env_or("COURIER_BASE_FRONTEND_URL", "http://localhost:5173"),
            uploads_dir: PathBuf::from(env_or("COURIER_UPLOADS_DIR", "uploads")),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.smtp.username.is_empty() {
        warn!("COURIER_SMTP_USERNAME is empty; outgoing mail will fail to authenticate");
    }
    if config.meta_token.is_empty() {
        warn!("COURIER_META_TOKEN is empty; sends must carry a token per request");
    }

    // Init database
    let db = courier_db::Database::open(&PathBuf::from(&config.db_path))?;

    let mailer = Mailer::new(&config.smtp)?;
    let gateway = GatewayClient::new(courier_gateway::DEFAULT_BASE_URL)?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        mailer,
        gateway,
        settings: Settings {
            meta_token: config.meta_token,
            phone_number_id: config.phone_number_id,
            webhook_verify_token: config.webhook_verify_token,
            base_frontend_url: config.base_frontend_url,
            uploads_dir: config.uploads_dir,
            languages: LanguageMap::with_defaults(),
        },
    });

    // Routes
    let auth_routes = Router::new()
        .route("/api/admin/register", post(auth::register_admin))
        .route("/api/admin/verify", get(auth::verify_admin_email))
        .route("/api/admin/login", post(auth::login_admin))
        .route("/api/admin/verify-login", get(auth::verify_login))
        .route("/api/users/register", post(auth::register_user))
        .route("/api/users/login", post(auth::login_user))
        .route("/api/users/verify-login", get(auth::verify_login));

    let crm_routes = Router::new()
        .route("/api/clients", post(clients::create_client))
        .route("/api/clients", get(clients::list_clients))
        .route("/api/clients/{id}", get(clients::get_client))
        .route("/api/clients/{id}", put(clients::update_client))
        .route("/api/clients/{id}", delete(clients::delete_client))
        .route("/api/contacts", post(contacts::create_contact))
        .route("/api/contacts", get(contacts::list_contacts))
        .route("/api/groups", post(groups::create_group))
        .route("/api/groups", get(groups::list_groups))
        .route("/api/templates", post(templates::create_template))
        .route("/api/templates", get(templates::list_templates))
        .route("/api/templates/{id}", put(templates::update_template))
        .route("/api/templates/{id}", delete(templates::delete_template));

    let document_routes = Router::new()
        .route("/api/documents/clients/{client_id}", post(documents::upload_document))
        .route("/api/documents/clients/{client_id}", get(documents::list_documents))
        .route("/api/documents/{id}/download", get(documents::download_document))
        .route("/api/documents/{id}", delete(documents::delete_document));

    let messaging_routes = Router::new()
        .route("/api/whatsapp/send-message", post(messages::send_message))
        .route("/api/whatsapp/send-template-message", post(messages::send_template_message))
        .route("/api/whatsapp/send-bulk-template", post(messages::send_bulk_template))
        .route("/api/whatsapp/conversations", get(messages::list_conversations))
        .route("/api/whatsapp/messages/{number}", get(messages::get_messages))
        .route("/api/whatsapp/webhook", get(webhook::verify_webhook))
        .route("/api/whatsapp/webhook", post(webhook::receive_webhook))
        .route("/api/campaigns/send", post(campaigns::send_campaign));

    let app = Router::new()
        .route("/api/health", get(health))
        .merge(auth_routes)
        .merge(crm_routes)
        .merge(document_routes)
        .merge(messaging_routes)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Courier server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "API corriendo correctamente" }))
}
