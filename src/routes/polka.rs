/// Payment provider webhook
///
/// Authenticated with the shared `ApiKey`, never with a user's access token.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::ServiceCaller;
use crate::error::AppError;
use crate::storage::{AccountRepository, StorageError};

pub const UPGRADE_EVENT: &str = "user.upgraded";

/// Only `user.upgraded` events must name a user
#[derive(Deserialize, Default)]
pub struct WebhookData {
    pub user_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct WebhookRequest {
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

/// POST /api/polka/webhooks
///
/// Events other than `user.upgraded` are acknowledged and ignored.
///
/// # Errors
/// - 401: missing or wrong api key
/// - 400: upgrade event without a user id
/// - 404: upgraded user does not exist
#[tracing::instrument(name = "Handling payment webhook", skip(_caller, form, accounts), fields(event = %form.event))]
pub async fn polka_webhook(
    _caller: ServiceCaller,
    form: web::Json<WebhookRequest>,
    accounts: web::Data<dyn AccountRepository>,
) -> Result<HttpResponse, AppError> {
    if form.event != UPGRADE_EVENT {
        tracing::debug!("Ignoring webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = form
        .data
        .user_id
        .ok_or_else(|| AppError::InvalidInput("data.user_id is required".to_string()))?;
    accounts
        .upgrade_account(user_id)
        .await
        .map_err(|e| match e {
            StorageError::NotFound => AppError::NotFound("user not found".to_string()),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user_id, "Account upgraded");
    Ok(HttpResponse::NoContent().finish())
}
