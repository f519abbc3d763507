/// Access Token Generation and Validation
///
/// HS256-signed JWTs carrying only the account id. Access tokens are stateless:
/// signature and expiry decide validity and nothing is looked up, which is why
/// their lifetime is capped at one hour.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::claims::{Claims, ACCESS_TOKEN_ISSUER};
use crate::clock::Clock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature does not match")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
    #[error("token is malformed")]
    Malformed,
    #[error("token could not be signed: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl AccessTokenCodec {
    pub fn new(secret: &Secret<String>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `account_id` with the configured lifetime
    pub fn issue(&self, account_id: Uuid) -> Result<String, TokenError> {
        self.issue_with_ttl(account_id, self.ttl)
    }

    pub fn issue_with_ttl(&self, account_id: Uuid, ttl: Duration) -> Result<String, TokenError> {
        let claims = Claims::new(account_id, self.clock.now(), ttl)
            .ok_or_else(|| TokenError::Encoding("token expiry out of range".to_string()))?;

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify signature, issuer and expiry, then return the subject.
    ///
    /// The signature is checked before anything in the payload is trusted. Expiry
    /// is compared against the injected clock with no leeway.
    pub fn validate(&self, token: &str) -> Result<Uuid, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ACCESS_TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "Access token rejected by decoder");
                TokenError::from(e)
            })?
            .claims;

        if claims.is_expired_at(self.clock.now()) {
            return Err(TokenError::Expired);
        }

        claims.account_id().ok_or(TokenError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, SystemClock};

    fn codec(secret: &str, clock: Arc<dyn Clock>) -> AccessTokenCodec {
        AccessTokenCodec::new(
            &Secret::new(secret.to_string()),
            Duration::seconds(3600),
            clock,
        )
    }

    #[test]
    fn test_issue_and_validate() {
        let codec = codec("s3cret", Arc::new(SystemClock));
        let account_id = Uuid::new_v4();

        let token = codec.issue(account_id).expect("Failed to issue token");
        assert_eq!(codec.validate(&token), Ok(account_id));
    }

    #[test]
    fn test_wrong_secret_is_signature_invalid() {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let token = codec("s3cret", clock.clone())
            .issue(Uuid::new_v4())
            .unwrap();

        let result = codec("wrongsecret", clock).validate(&token);
        assert_eq!(result, Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_expired_after_ttl() {
        let clock = Arc::new(ManualClock::default());
        let codec = codec("s3cret", clock.clone());
        let account_id = Uuid::new_v4();

        let token = codec
            .issue_with_ttl(account_id, Duration::seconds(1))
            .unwrap();
        assert_eq!(codec.validate(&token), Ok(account_id));

        clock.advance(Duration::seconds(2));
        assert_eq!(codec.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_valid_until_ttl_elapses() {
        let clock = Arc::new(ManualClock::default());
        let codec = codec("s3cret", clock.clone());
        let account_id = Uuid::new_v4();
        let token = codec.issue(account_id).unwrap();

        clock.advance(Duration::seconds(3599));
        assert_eq!(codec.validate(&token), Ok(account_id));
    }

    #[test]
    fn test_overflowing_ttl_is_an_error() {
        let codec = codec("s3cret", Arc::new(SystemClock));

        let result = codec.issue_with_ttl(Uuid::new_v4(), Duration::days(365 * 1_000_000));
        assert!(matches!(result, Err(TokenError::Encoding(_))));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec("s3cret", Arc::new(SystemClock));

        for token in ["", "invalid.token.here", "abc", "a.b"] {
            assert_eq!(codec.validate(token), Err(TokenError::Malformed), "{:?}", token);
        }
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = codec("s3cret", Arc::new(SystemClock));
        let token = codec.issue(Uuid::new_v4()).unwrap();

        let tampered = format!("{}X", token);
        assert!(codec.validate(&tampered).is_err());
    }

    #[test]
    fn test_forged_subject_rejected() {
        let codec = codec("s3cret", Arc::new(SystemClock));
        let token = codec.issue(Uuid::new_v4()).unwrap();

        // swap in a payload for a different account, keep the original signature
        let other = codec.issue(Uuid::new_v4()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert_eq!(codec.validate(&forged), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let secret = "s3cret";
        let now = chrono::Utc::now();
        let mut claims = Claims::new(Uuid::new_v4(), now, Duration::seconds(60)).unwrap();
        claims.iss = "someone-else".to_string();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let result = codec(secret, Arc::new(SystemClock)).validate(&token);
        assert_eq!(result, Err(TokenError::Malformed));
    }

    #[test]
    fn test_non_uuid_subject_is_malformed() {
        let secret = "s3cret";
        let mut claims = Claims::new(Uuid::new_v4(), chrono::Utc::now(), Duration::seconds(60)).unwrap();
        claims.sub = "not-a-uuid".to_string();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let result = codec(secret, Arc::new(SystemClock)).validate(&token);
        assert_eq!(result, Err(TokenError::Malformed));
    }
}
