/// Application error taxonomy
///
/// Every handler returns `Result<_, AppError>`. Component errors (password,
/// token, credential, storage) convert into one of six kinds, and each kind maps
/// to exactly one HTTP status. Authentication failures keep their internal reason
/// for logs but always present the same message to the caller.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

use crate::auth::{CredentialMissing, PasswordError, RefreshTokenError, TokenError};
use crate::storage::StorageError;

/// Message returned for every authentication failure.
pub const UNAUTHENTICATED_MESSAGE: &str = "invalid or missing credentials";

/// Why a request failed to authenticate. Logged, never returned.
#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    #[error("authorization header missing or malformed")]
    MissingCredential,
    #[error("access token rejected: {0}")]
    InvalidAccessToken(TokenError),
    #[error("unknown email or wrong password")]
    InvalidCredentials,
    #[error("refresh token unknown, expired or revoked")]
    InvalidRefreshToken,
    #[error("service api key mismatch")]
    InvalidApiKey,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unauthenticated: {0}")]
    Unauthenticated(AuthFailure),
    #[error("forbidden")]
    Forbidden,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AuthFailure> for AppError {
    fn from(failure: AuthFailure) -> Self {
        AppError::Unauthenticated(failure)
    }
}

impl From<CredentialMissing> for AuthFailure {
    fn from(_: CredentialMissing) -> Self {
        AuthFailure::MissingCredential
    }
}

impl From<CredentialMissing> for AppError {
    fn from(err: CredentialMissing) -> Self {
        AppError::Unauthenticated(err.into())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(msg) => AppError::Internal(format!("token signing failed: {}", msg)),
            other => AppError::Unauthenticated(AuthFailure::InvalidAccessToken(other)),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => AppError::NotFound("resource not found".to_string()),
            StorageError::Conflict(msg) => AppError::Conflict(msg),
            StorageError::Backend(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RefreshTokenError> for AppError {
    fn from(err: RefreshTokenError) -> Self {
        match err {
            RefreshTokenError::NotFound => AppError::Unauthenticated(AuthFailure::InvalidRefreshToken),
            RefreshTokenError::ExpiryOverflow => {
                AppError::Internal("refresh token expiry out of range".to_string())
            }
            RefreshTokenError::Storage(e) => e.into(),
        }
    }
}

/// JSON body for every error response
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Correlates the response with the server log line
    pub error_id: String,
    pub message: String,
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Unauthenticated(_) => "UNAUTHENTICATED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Text safe to show the caller
    fn public_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::Unauthenticated(_) => UNAUTHENTICATED_MESSAGE.to_string(),
            AppError::Forbidden => "not allowed to modify this resource".to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Conflict(_) => "resource already exists".to_string(),
            AppError::Internal(_) => "internal server error".to_string(),
        }
    }

    fn log(&self, error_id: &str) {
        match self {
            AppError::Unauthenticated(reason) => {
                tracing::warn!(error_id = error_id, reason = %reason, "Authentication failed");
            }
            AppError::Forbidden => {
                tracing::warn!(error_id = error_id, "Authorization denied");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
            other => {
                tracing::info!(error_id = error_id, error = %other, "Request rejected");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log(&error_id);

        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse::new(
            error_id,
            self.public_message(),
            self.code().to_string(),
            status.as_u16(),
        ))
    }
}
