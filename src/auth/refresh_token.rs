/// Refresh Token Management
///
/// Refresh tokens are:
/// - 64 alphanumeric characters drawn from a CSPRNG (~381 bits)
/// - bound to exactly one account, with a fixed expiry horizon
/// - revocable once; revocation is a compare-and-set in the store
/// - never rotated on use: a token stays valid until it expires or is revoked
///
/// Callers must report "not found", "expired" and "revoked" identically.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::RefreshToken;
use crate::storage::{RefreshTokenRepository, StorageError};

pub const REFRESH_TOKEN_LENGTH: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token expiry out of range")]
    ExpiryOverflow,
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for RefreshTokenError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => RefreshTokenError::NotFound,
            other => RefreshTokenError::Storage(other),
        }
    }
}

/// Generate a new opaque refresh token value
pub fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[derive(Clone)]
pub struct RefreshTokenStore {
    repository: Arc<dyn RefreshTokenRepository>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl RefreshTokenStore {
    pub fn new(
        repository: Arc<dyn RefreshTokenRepository>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            repository,
            clock,
            ttl,
        }
    }

    /// Mint and persist a token for `account_id`.
    ///
    /// Earlier tokens for the same account stay valid.
    pub async fn create(&self, account_id: Uuid) -> Result<RefreshToken, RefreshTokenError> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(RefreshTokenError::ExpiryOverflow)?;
        let record = RefreshToken {
            token: generate_refresh_token(),
            user_id: account_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        };

        self.repository.create_refresh_token(&record).await?;
        tracing::debug!(user_id = %account_id, expires_at = %record.expires_at, "Refresh token created");
        Ok(record)
    }

    pub async fn lookup(&self, token: &str) -> Result<RefreshToken, RefreshTokenError> {
        Ok(self.repository.get_refresh_token(token).await?)
    }

    /// Revoke `token`. Idempotent: unknown or already-revoked tokens succeed.
    pub async fn revoke(&self, token: &str) -> Result<(), RefreshTokenError> {
        let revoked = self
            .repository
            .revoke_refresh_token(token, self.clock.now())
            .await?;

        if revoked {
            tracing::info!("Refresh token revoked");
        } else {
            tracing::debug!("Revoke requested for unknown or already revoked refresh token");
        }
        Ok(())
    }

    pub fn is_usable(&self, record: &RefreshToken, now: DateTime<Utc>) -> bool {
        record.is_usable(now)
    }

    /// Look up `token` and return its owner if it can still authorize a refresh
    pub async fn usable_owner(&self, token: &str) -> Result<Uuid, RefreshTokenError> {
        let record = self.lookup(token).await?;

        if !self.is_usable(&record, self.clock.now()) {
            tracing::warn!(
                user_id = %record.user_id,
                revoked = record.revoked_at.is_some(),
                "Unusable refresh token presented"
            );
            return Err(RefreshTokenError::NotFound);
        }
        Ok(record.user_id)
    }
}
