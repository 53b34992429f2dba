//! Account registration and the PIN-based two-factor login flow.
//!
//! Login never returns a session by itself: a successful credential
//! check issues a 5-digit PIN, emails it out-of-band, and the client
//! completes the flow through the verify-login endpoint. PIN issuance
//! and email dispatch are deliberately decoupled — a failed email
//! leaves the token valid and is only logged.

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::{Query, State}, http::StatusCode, response::IntoResponse};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use tracing::{error, info};
use uuid::Uuid;

use courier_db::models::{AccountKind, EmailVerifyOutcome, VerifyOutcome};
use courier_types::api::{
    AdminLoginRequest, AdminRegisterRequest, MessageResponse, StatusResponse, UserLoginRequest,
    UserRegisterRequest, UserRegisterResponse, VerifyEmailQuery, VerifyPinQuery,
};

use crate::error::{ApiError, blocking};
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Credenciales incorrectas.";
const LOGIN_OK: &str =
    "Inicio de sesión exitoso. Se ha enviado un PIN a tu correo (válido por 15 minutos).";

// -- Registration --

pub async fn register_admin(
    State(state): State<AppState>,
    Json(req): Json<AdminRegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() || req.password.trim().is_empty() || req.email.trim().is_empty()
    {
        return Err(ApiError::Validation("Todos los campos son obligatorios.".into()));
    }

    let (username, email) = (req.username.clone(), req.email.clone());
    let db = state.clone();
    let (name_taken, email_taken) =
        blocking(move || db.db.admin_exists(&username, &email)).await?;
    if name_taken {
        return Err(ApiError::Conflict("El nombre de usuario ya está registrado.".into()));
    }
    if email_taken {
        return Err(ApiError::Conflict("El correo ya está registrado.".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let verification_token = Uuid::new_v4().to_string();

    let db = state.clone();
    let (username, email, token) = (req.username.clone(), req.email.clone(), verification_token.clone());
    blocking(move || db.db.create_admin(&username, &email, &password_hash, &token)).await?;

    let link = format!(
        "{}/verify?correo={}&token={}",
        state.settings.base_frontend_url.trim_end_matches('/'),
        utf8_percent_encode(&req.email, NON_ALPHANUMERIC),
        utf8_percent_encode(&verification_token, NON_ALPHANUMERIC),
    );

    if let Err(e) = state.mailer.send_verification_link(&req.email, &link).await {
        // Registration stands; the link can be re-requested.
        error!(email = %req.email, error = %e, "verification email failed");
    }

    Ok(Json(MessageResponse::new(
        "Administrador registrado correctamente. Verifique su correo.",
    )))
}

/// Consume an email-verification link. Tri-state, always 200: a second
/// call with a spent token is a warning, not an error.
pub async fn verify_admin_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    if query.correo.trim().is_empty() || query.token.trim().is_empty() {
        return Err(ApiError::Validation("Correo o token inválido.".into()));
    }

    let db = state.clone();
    let outcome =
        blocking(move || db.db.verify_admin_email(&query.correo, &query.token)).await?;

    let response = match outcome {
        EmailVerifyOutcome::Verified => StatusResponse::success("Cuenta verificada correctamente."),
        EmailVerifyOutcome::AlreadyVerified => {
            StatusResponse::warning("La cuenta ya fue verificada anteriormente.")
        }
        EmailVerifyOutcome::Invalid => StatusResponse::error("Token inválido o expirado."),
    };
    Ok(Json(response))
}

pub async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<UserRegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() || req.password.trim().is_empty() || req.email.trim().is_empty()
    {
        return Err(ApiError::Validation("Todos los campos son obligatorios.".into()));
    }

    let (username, email) = (req.username.clone(), req.email.clone());
    let db = state.clone();
    let (name_taken, email_taken) = blocking(move || db.db.user_exists(&username, &email)).await?;
    if name_taken || email_taken {
        return Err(ApiError::Conflict("El usuario ya existe en el sistema.".into()));
    }

    let password_hash = hash_password(&req.password)?;
    let db = state.clone();
    let req_db = req;
    let (username, email) = (req_db.username.clone(), req_db.email.clone());
    let user_id = blocking(move || {
        db.db.create_user(
            &req_db.username,
            &req_db.email,
            &password_hash,
            req_db.phone.as_deref(),
            req_db.server_url.as_deref(),
            req_db.active,
        )
    })
    .await?;

    Ok(Json(UserRegisterResponse {
        message: "Usuario registrado correctamente.".into(),
        user_id,
        username,
        email,
    }))
}

// -- Login (credential check + PIN issuance) --

pub async fn login_admin(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.email.trim().is_empty() || req.password.trim().is_empty() {
        return Err(ApiError::Validation("Correo y contraseña son obligatorios.".into()));
    }

    let email = req.email.clone();
    let db = state.clone();
    let admin = blocking(move || db.db.get_admin_by_email(&email))
        .await?
        .ok_or_else(|| ApiError::Unauthorized(BAD_CREDENTIALS.into()))?;

    if !verify_password(&req.password, &admin.password_hash)? {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    }
    if !admin.email_verified {
        return Err(ApiError::Unauthorized(
            "Debe verificar su correo antes de iniciar sesión.".into(),
        ));
    }

    issue_pin(&state, AccountKind::Admin, admin.id, &admin.username, &admin.email).await?;
    Ok(Json(MessageResponse::new(LOGIN_OK)))
}

pub async fn login_user(
    State(state): State<AppState>,
    Json(req): Json<UserLoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.trim().is_empty() || req.password.trim().is_empty() {
        return Err(ApiError::Validation("Usuario y contraseña son obligatorios.".into()));
    }

    let username = req.username.clone();
    let db = state.clone();
    let user = blocking(move || db.db.get_user_by_username(&username))
        .await?
        .ok_or_else(|| ApiError::Unauthorized(BAD_CREDENTIALS.into()))?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    }
    if !user.active {
        return Err(ApiError::Unauthorized(
            "Debe activar su cuenta antes de iniciar sesión.".into(),
        ));
    }

    issue_pin(&state, AccountKind::User, user.id, &user.username, &user.email).await?;
    Ok(Json(MessageResponse::new(LOGIN_OK)))
}

/// Verify a login PIN. Shared by both account variants; the outcome
/// contract is identical for admin and user tokens.
pub async fn verify_login(
    State(state): State<AppState>,
    Query(query): Query<VerifyPinQuery>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    if query.token.trim().is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::error("No se proporcionó el token (PIN).")),
        ));
    }

    let db = state.clone();
    let outcome = blocking(move || db.db.verify_auth_token(&query.token)).await?;

    let response = match outcome {
        VerifyOutcome::Valid => StatusResponse::success("PIN válido. Acceso verificado."),
        VerifyOutcome::ExpiredOrUsed => StatusResponse::warning("PIN expirado o ya utilizado."),
        VerifyOutcome::NotFound => StatusResponse::error("PIN no válido o no encontrado."),
    };
    Ok((StatusCode::OK, Json(response)))
}

// -- Helpers --

/// Generate, persist, and email a login PIN. Email failure is logged
/// and swallowed: the token was already persisted and remains valid.
async fn issue_pin(
    state: &AppState,
    kind: AccountKind,
    account_id: i64,
    name: &str,
    email: &str,
) -> Result<(), ApiError> {
    let pin = generate_pin();

    let db = state.clone();
    let stored_pin = pin.clone();
    blocking(move || db.db.insert_auth_token(kind, account_id, &stored_pin)).await?;
    info!(account_id, kind = kind.as_str(), "login PIN issued");

    if let Err(e) = state.mailer.send_pin(name, email, &pin).await {
        error!(account_id, error = %e, "PIN email failed; token remains valid");
    }
    Ok(())
}

/// Uniform 5-digit PIN in [10000, 99999]; leading zeros are excluded
/// by construction.
fn generate_pin() -> String {
    rand::rng().random_range(10_000..=99_999u32).to_string()
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(anyhow!("password hashing failed: {e}")))
}

fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| ApiError::Internal(anyhow!("corrupt password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pins_are_five_digits_without_leading_zeros() {
        for _ in 0..200 {
            let pin = generate_pin();
            assert_eq!(pin.len(), 5);
            let value: u32 = pin.parse().unwrap();
            assert!((10_000..=99_999).contains(&value));
        }
    }

    #[test]
    fn password_hashing_round_trip() {
        let hash = hash_password("p1").unwrap();
        assert!(verify_password("p1", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
        // Salted: hashing the same password twice differs.
        assert_ne!(hash, hash_password("p1").unwrap());
    }
}
