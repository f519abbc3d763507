/// Session routes
///
/// Login with email and password, exchange a refresh token for a new access
/// token, and revoke a refresh token. Refresh and revoke take the refresh token
/// as a `Bearer` credential.

use actix_web::{web, HttpRequest, HttpResponse};
use secrecy::Secret;
use serde::{Deserialize, Serialize};

use crate::auth::{bearer_token, SessionService};
use crate::error::AppError;
use crate::models::AccountResponse;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: Secret<String>,
}

/// Account view plus both halves of the session
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub account: AccountResponse,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 401: unknown email or wrong password, with the same body for both
/// - 500: internal server error
#[tracing::instrument(name = "Logging in", skip(form, sessions), fields(email = %form.email.trim()))]
pub async fn login(
    form: web::Json<LoginRequest>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { email, password } = form.into_inner();

    let session = sessions.login(email.trim(), password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        account: AccountResponse::from(&session.account),
        token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}

/// POST /api/refresh
///
/// Mints a new access token. The refresh token is not rotated.
///
/// # Errors
/// - 401: missing, unknown, expired or revoked refresh token
#[tracing::instrument(name = "Refreshing access token", skip(req, sessions))]
pub async fn refresh(
    req: HttpRequest,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = bearer_token(req.headers())?;
    let token = sessions.refresh(&refresh_token).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse { token }))
}

/// POST /api/revoke
///
/// Idempotent: revoking an unknown or already revoked token still answers 204.
#[tracing::instrument(name = "Revoking refresh token", skip(req, sessions))]
pub async fn revoke(
    req: HttpRequest,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = bearer_token(req.headers())?;
    sessions.revoke(&refresh_token).await?;

    Ok(HttpResponse::NoContent().finish())
}
