/// Storage collaborator
///
/// Keyed CRUD interfaces the auth core and routes consume. Two backends:
/// Postgres (production) and an in-process map (tests, local runs).

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Account, Chirp, NewAccount, NewChirp, RefreshToken, SortOrder};

pub use memory::InMemoryStorage;
pub use postgres::PgStorage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate entry: {0}")]
    Conflict(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                StorageError::Conflict(db.message().to_string())
            }
            other => StorageError::Backend(other.to_string()),
        }
    }
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create_account(&self, account: NewAccount) -> Result<Account, StorageError>;
    async fn get_account_by_email(&self, email: &str) -> Result<Account, StorageError>;
    async fn get_account_by_id(&self, id: Uuid) -> Result<Account, StorageError>;
    async fn update_account_credentials(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<Account, StorageError>;
    /// Set the upgraded flag. `NotFound` if the account does not exist.
    async fn upgrade_account(&self, id: Uuid) -> Result<(), StorageError>;
    /// Drop every account along with its tokens and chirps.
    async fn delete_all_accounts(&self) -> Result<(), StorageError>;
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn create_refresh_token(&self, token: &RefreshToken) -> Result<(), StorageError>;
    async fn get_refresh_token(&self, token: &str) -> Result<RefreshToken, StorageError>;
    /// Atomically set `revoked_at` if it is still unset.
    ///
    /// Returns `true` when this call performed the transition, `false` when the
    /// token was already revoked or does not exist.
    async fn revoke_refresh_token(
        &self,
        token: &str,
        revoked_at: DateTime<Utc>,
    ) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait ChirpRepository: Send + Sync {
    async fn create_chirp(&self, chirp: NewChirp) -> Result<Chirp, StorageError>;
    async fn list_chirps(
        &self,
        author: Option<Uuid>,
        order: SortOrder,
    ) -> Result<Vec<Chirp>, StorageError>;
    async fn get_chirp(&self, id: Uuid) -> Result<Chirp, StorageError>;
    async fn delete_chirp(&self, id: Uuid) -> Result<(), StorageError>;
}

/// Handles to each repository, usually all backed by the same store.
#[derive(Clone)]
pub struct Stores {
    pub accounts: Arc<dyn AccountRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub chirps: Arc<dyn ChirpRepository>,
}

impl Stores {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::from_shared(Arc::new(PgStorage::new(pool)))
    }

    pub fn in_memory() -> Self {
        Self::from_shared(Arc::new(InMemoryStorage::default()))
    }

    fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: AccountRepository + RefreshTokenRepository + ChirpRepository + 'static,
    {
        Self {
            accounts: store.clone(),
            refresh_tokens: store.clone(),
            chirps: store,
        }
    }
}
