//! HTTP client for the conversational messaging platform
//! (WhatsApp Business Cloud API).

pub mod payload;
pub mod templating;

pub use payload::OutboundMessage;
pub use templating::LanguageMap;

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v22.0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway answered with a non-success status. The body is the
    /// gateway's error response, returned to callers verbatim.
    #[error("gateway rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// POST one message to `{base}/{phone_number_id}/messages` with
    /// bearer auth. Single attempt, no retries.
    pub async fn send(
        &self,
        phone_number_id: &str,
        bearer_token: &str,
        message: &OutboundMessage,
    ) -> Result<(), GatewayError> {
        let url = format!(
            "{}/{}/messages",
            self.base_url.trim_end_matches('/'),
            phone_number_id
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(bearer_token)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(to = message.recipient(), "gateway accepted message");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}
