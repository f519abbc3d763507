/// JWT Claims structure
///
/// Payload of an access token: registered claims only (RFC 7519). No profile
/// data rides along; the subject is the account id and nothing else.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer tag that namespaces access tokens
pub const ACCESS_TOKEN_ISSUER: &str = "chirpy-access";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (account id as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// `None` if `issued_at + ttl` is not a representable time
    pub fn new(account_id: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Option<Self> {
        let expires_at = issued_at.checked_add_signed(ttl)?;

        Some(Self {
            iss: ACCESS_TOKEN_ISSUER.to_string(),
            sub: account_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// `None` if the subject is not a UUID
    pub fn account_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    /// Expired once `now` is strictly past `exp`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }
}
