/// Account routes
///
/// Registration is public. Changing email and password requires an access
/// token and only ever touches the caller's own account.

use actix_web::{web, HttpResponse};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use crate::auth::{AuthContext, PasswordHasher};
use crate::error::AppError;
use crate::models::{AccountResponse, NewAccount};
use crate::storage::AccountRepository;
use crate::validators::{is_valid_email, is_valid_password};

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: Secret<String>,
}

impl CredentialsRequest {
    /// Trimmed email, after both fields pass validation
    fn validate(&self) -> Result<String, AppError> {
        let email = is_valid_email(&self.email)?;
        is_valid_password(self.password.expose_secret())?;
        Ok(email)
    }
}

/// POST /api/users
///
/// # Errors
/// - 400: invalid email or password
/// - 409: email already registered
#[tracing::instrument(name = "Creating account", skip(form, accounts, hasher), fields(email = %form.email.trim()))]
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    accounts: web::Data<dyn AccountRepository>,
    hasher: web::Data<PasswordHasher>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let email = form.validate()?;
    let hashed_password = hasher.hash_blocking(form.password).await?;

    let account = accounts
        .create_account(NewAccount {
            email,
            hashed_password,
        })
        .await?;

    tracing::info!(user_id = %account.id, "Account created");
    Ok(HttpResponse::Created().json(AccountResponse::from(&account)))
}

/// PUT /api/users
///
/// # Errors
/// - 401: missing or invalid access token
/// - 400: invalid email or password
/// - 409: email taken by another account
#[tracing::instrument(name = "Updating account", skip(caller, form, accounts, hasher), fields(user_id = %caller.account_id))]
pub async fn update_user(
    caller: AuthContext,
    form: web::Json<CredentialsRequest>,
    accounts: web::Data<dyn AccountRepository>,
    hasher: web::Data<PasswordHasher>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let email = form.validate()?;
    let hashed_password = hasher.hash_blocking(form.password).await?;

    let account = accounts
        .update_account_credentials(caller.account_id, &email, &hashed_password)
        .await?;

    tracing::info!("Account credentials updated");
    Ok(HttpResponse::Ok().json(AccountResponse::from(&account)))
}
