// Authentication error taxonomy and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Every failure a flow can surface to the boundary.
///
/// Nothing is retried internally; callers decide whether to try again.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    ValidationError(validator::ValidationErrors),

    #[error("Username already exists")]
    DuplicateUsername,

    /// Same outcome for an unknown username and a wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Identity not found")]
    IdentityNotFound,

    #[error("User with id {0} not found")]
    UserNotFound(String),

    #[error("Missing authentication token")]
    MissingCredential,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Malformed token")]
    Malformed,

    #[error("Token has expired")]
    TokenExpired,

    /// Valid signature and unexpired, but superseded by a later issuance
    #[error("Token is no longer current")]
    StaleToken,

    #[error("Token kind not accepted here")]
    WrongTokenKind,

    /// The refresh token itself expired; only a password login can recover
    #[error("Refresh token has expired, login required")]
    MustRelogin,

    #[error("Record store operation timed out")]
    StoreTimeout,

    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Password hashing error: {0}")]
    PasswordHashError(String),

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),
}

/// JSON body returned for every error
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable reason code (e.g. "expired", "stale")
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub timestamp: String,
}

impl AuthError {
    /// Reason code reported to clients.
    /// Signature, decoding, kind and unknown-identity failures all collapse to "invalid".
    pub fn reason_code(&self) -> &'static str {
        match self {
            AuthError::ValidationError(_) => "validation_error",
            AuthError::DuplicateUsername => "duplicate_username",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::IdentityNotFound
            | AuthError::InvalidSignature
            | AuthError::Malformed
            | AuthError::WrongTokenKind => "invalid",
            AuthError::UserNotFound(_) => "not_found",
            AuthError::MissingCredential => "missing_credential",
            AuthError::TokenExpired => "expired",
            AuthError::StaleToken => "stale",
            AuthError::MustRelogin => "must_relogin",
            AuthError::StoreTimeout => "store_timeout",
            AuthError::StoreUnavailable(_) => "store_unavailable",
            AuthError::PasswordHashError(_) | AuthError::TokenGenerationError(_) => {
                "internal_error"
            }
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AuthError::DuplicateUsername => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::IdentityNotFound
            | AuthError::MissingCredential
            | AuthError::InvalidSignature
            | AuthError::Malformed
            | AuthError::TokenExpired
            | AuthError::StaleToken
            | AuthError::WrongTokenKind
            | AuthError::MustRelogin => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AuthError::StoreTimeout => StatusCode::GATEWAY_TIMEOUT,
            AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::PasswordHashError(_) | AuthError::TokenGenerationError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to send to clients (no store or crypto internals)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::ValidationError(_) => "Request validation failed".to_string(),
            AuthError::IdentityNotFound
            | AuthError::InvalidSignature
            | AuthError::Malformed
            | AuthError::WrongTokenKind => "Invalid token".to_string(),
            AuthError::StoreTimeout | AuthError::StoreUnavailable(_) => {
                "Service temporarily unavailable".to_string()
            }
            AuthError::PasswordHashError(_) | AuthError::TokenGenerationError(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    fn log(&self) {
        match self {
            AuthError::ValidationError(errors) => debug!("Validation error: {:?}", errors),
            AuthError::DuplicateUsername | AuthError::UserNotFound(_) => debug!("{}", self),
            AuthError::StoreTimeout
            | AuthError::StoreUnavailable(_)
            | AuthError::PasswordHashError(_)
            | AuthError::TokenGenerationError(_) => error!("Auth failure: {}", self),
            _ => warn!("Rejected credential: {}", self),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();

        let details = match &self {
            AuthError::ValidationError(errors) => {
                Some(serde_json::to_value(errors).unwrap_or(serde_json::json!({})))
            }
            _ => None,
        };

        let body = ErrorResponse {
            error_code: self.reason_code().to_string(),
            message: self.error_message(),
            details,
            timestamp: Utc::now().to_rfc3339(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::ValidationError(errors)
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::PoolTimedOut => AuthError::StoreTimeout,
            other => AuthError::StoreUnavailable(other.to_string()),
        }
    }
}
