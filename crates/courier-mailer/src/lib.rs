//! Outbound email over authenticated SMTP (STARTTLS).
//!
//! Delivers the login PIN and the account-verification link. Transport
//! failures carry enough shape for callers to tell an authentication
//! rejection from a connection problem; callers decide whether a
//! failure is fatal (login deliberately keeps its token valid when the
//! PIN email fails).

use std::time::Duration;

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::response::{Category, Severity};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP authentication rejected: {0}")]
    Auth(String),
    #[error("SMTP connection failed: {0}")]
    Connect(String),
    #[error("SMTP send failed: {0}")]
    Send(String),
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),
}

/// Map a lettre transport error onto the auth / connect / generic split.
/// Auth rejections are permanent 53x responses; anything without an
/// SMTP status never reached the response phase.
fn classify(err: lettre::transport::smtp::Error) -> MailError {
    match err.status() {
        Some(code)
            if matches!(code.severity, Severity::PermanentNegativeCompletion)
                && matches!(code.category, Category::Unspecified3) =>
        {
            MailError::Auth(err.to_string())
        }
        Some(_) => MailError::Send(err.to_string()),
        None => MailError::Connect(err.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_name: String,
}

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn new(cfg: &SmtpConfig) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .map_err(classify)?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        let from = Mailbox::new(Some(cfg.from_name.clone()), cfg.username.parse()?);

        Ok(Self { transport, from })
    }

    pub async fn send(
        &self,
        to_name: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(Mailbox::new(Some(to_name.to_string()), to.parse()?))
            .subject(subject)
            .body(body.to_string())?;

        self.transport.send(message).await.map_err(classify)?;
        info!(to, subject, "email dispatched");
        Ok(())
    }

    /// One-time login PIN, valid for 15 minutes.
    pub async fn send_pin(&self, name: &str, to: &str, pin: &str) -> Result<(), MailError> {
        self.send(
            name,
            to,
            "Tu PIN de acceso (válido por 15 minutos)",
            &pin_body(name, pin),
        )
        .await
    }

    /// Account-verification link for a freshly registered admin.
    pub async fn send_verification_link(&self, to: &str, link: &str) -> Result<(), MailError> {
        self.send(
            "",
            to,
            "Verificación de Cuenta - Courier",
            &verification_body(link),
        )
        .await
    }
}

pub fn pin_body(name: &str, pin: &str) -> String {
    format!(
        "Hola {name},\n\nTu PIN de acceso es: {pin}\nEste PIN vence en 15 minutos.\n\nSi no solicitaste este acceso, ignora este mensaje."
    )
}

pub fn verification_body(link: &str) -> String {
    format!("Haga clic en el siguiente enlace para verificar su cuenta:\n\n{link}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_body_carries_pin_and_expiry() {
        let body = pin_body("Ana", "12345");
        assert!(body.contains("12345"));
        assert!(body.contains("15 minutos"));
        assert!(body.starts_with("Hola Ana,"));
    }

    #[test]
    fn verification_body_carries_link() {
        let link = "https://app.example.com/verify?correo=a%40x.com&token=t";
        assert!(verification_body(link).contains(link));
    }
}
