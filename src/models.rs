/// Persistent records shared by the storage layer and the auth core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user.
///
/// `hashed_password` is an Argon2id PHC string and never leaves the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub hashed_password: String,
    pub is_chirpy_red: bool,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub hashed_password: String,
}

/// Public view of an [`Account`]
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            created_at: account.created_at,
            updated_at: account.updated_at,
            email: account.email.clone(),
            is_chirpy_red: account.is_chirpy_red,
        }
    }
}

/// Opaque long-lived session credential.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    /// Usable iff never revoked and not yet past its expiry.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Chirp {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewChirp {
    pub body: String,
    pub user_id: Uuid,
}

/// Chirp listing order by `created_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}
