/// Authentication and ownership checks
///
/// `authenticate` turns request headers into an [`AuthContext`];
/// `authorize` is a strict owner equality check with no roles. Handlers call
/// them in that order, loading the target resource in between, so callers without
/// valid credentials never learn whether a resource exists.

use actix_web::http::header::HeaderMap;
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

use crate::auth::credentials::{api_key, bearer_token};
use crate::auth::jwt::AccessTokenCodec;
use crate::error::{AppError, AuthFailure};

/// Identity recovered from a valid access token, scoped to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub account_id: Uuid,
}

#[derive(Clone)]
pub struct AuthorizationGuard {
    codec: AccessTokenCodec,
    service_key: Secret<String>,
}

impl AuthorizationGuard {
    pub fn new(codec: AccessTokenCodec, service_key: Secret<String>) -> Self {
        Self { codec, service_key }
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AuthFailure> {
        let token = bearer_token(headers)?;
        let account_id = self
            .codec
            .validate(&token)
            .map_err(AuthFailure::InvalidAccessToken)?;

        Ok(AuthContext { account_id })
    }

    pub fn authorize(&self, caller: &AuthContext, resource_owner: Uuid) -> Result<(), AppError> {
        if caller.account_id != resource_owner {
            tracing::warn!(
                caller = %caller.account_id,
                owner = %resource_owner,
                "Caller does not own the resource"
            );
            return Err(AppError::Forbidden);
        }
        Ok(())
    }

    /// Check the `ApiKey` credential of a service-to-service call
    pub fn authorize_service(&self, headers: &HeaderMap) -> Result<(), AuthFailure> {
        let provided = api_key(headers)?;

        if !keys_match(&provided, self.service_key.expose_secret()) {
            return Err(AuthFailure::InvalidApiKey);
        }
        Ok(())
    }
}

/// Constant-time comparison of a provided key with the expected one
pub fn keys_match(provided: &str, expected: &str) -> bool {
    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
