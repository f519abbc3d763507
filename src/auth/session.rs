/// Session lifecycle: login, refresh, revoke.
///
/// Login mints a refresh token and an access token. Refresh consults only the
/// refresh token store and never re-checks the password. Every credential
/// failure collapses into one `Unauthenticated` kind.

use secrecy::Secret;
use std::sync::Arc;

use crate::auth::jwt::AccessTokenCodec;
use crate::auth::password::PasswordHasher;
use crate::auth::refresh_token::RefreshTokenStore;
use crate::error::{AppError, AuthFailure};
use crate::models::Account;
use crate::storage::{AccountRepository, StorageError};

#[derive(Debug, Clone)]
pub struct Session {
    pub account: Account,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct SessionService {
    accounts: Arc<dyn AccountRepository>,
    hasher: PasswordHasher,
    codec: AccessTokenCodec,
    refresh_tokens: RefreshTokenStore,
}

impl SessionService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        hasher: PasswordHasher,
        codec: AccessTokenCodec,
        refresh_tokens: RefreshTokenStore,
    ) -> Self {
        Self {
            accounts,
            hasher,
            codec,
            refresh_tokens,
        }
    }

    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.codec.ttl().num_seconds()
    }

    /// Verify email and password and open a new session.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller,
    /// both in the error returned and in the hashing work performed.
    pub async fn login(&self, email: &str, password: Secret<String>) -> Result<Session, AppError> {
        let account = match self.accounts.get_account_by_email(email).await {
            Ok(account) => account,
            Err(StorageError::NotFound) => {
                self.hasher.verify_dummy_blocking(password).await?;
                return Err(AuthFailure::InvalidCredentials.into());
            }
            Err(e) => return Err(e.into()),
        };

        let matches = self
            .hasher
            .verify_blocking(password, account.hashed_password.clone())
            .await?;
        if !matches {
            return Err(AuthFailure::InvalidCredentials.into());
        }

        // not coupled: a failure after this leaves a usable refresh token behind
        let refresh = self.refresh_tokens.create(account.id).await?;
        let access_token = self.codec.issue(account.id)?;

        tracing::info!(user_id = %account.id, "User logged in");
        Ok(Session {
            account,
            access_token,
            refresh_token: refresh.token,
        })
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The refresh token itself is left untouched.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let account_id = self.refresh_tokens.usable_owner(refresh_token).await?;
        let access_token = self.codec.issue(account_id)?;

        tracing::info!(user_id = %account_id, "Access token refreshed");
        Ok(access_token)
    }

    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AppError> {
        self.refresh_tokens.revoke(refresh_token).await?;
        Ok(())
    }
}
