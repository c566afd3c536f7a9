// Identity records and request/response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::validation::validate_not_blank;

/// Persisted identity record (one per registered user)
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Identity {
    pub identity_id: String,
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    /// The only access token currently accepted for this identity
    pub current_access_token: Option<String>,
    /// The only refresh token currently accepted for this identity
    pub current_refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity as exposed to clients (no password hash, no tokens)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IdentityResponse {
    #[schema(example = "7f3c2a9e-4b1d-4e8a-9c5f-2d6b8e1a0f43")]
    pub identity_id: String,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "Alice A")]
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            identity_id: identity.identity_id,
            username: identity.username,
            full_name: identity.full_name,
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}

/// Signup request DTO
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(
        length(min = 2, max = 100, message = "Username must be 2-100 characters"),
        custom = "validate_not_blank"
    )]
    #[schema(example = "alice", min_length = 2, max_length = 100)]
    pub username: String,
    #[validate(
        length(min = 2, max = 100, message = "Full name must be 2-100 characters"),
        custom = "validate_not_blank"
    )]
    #[schema(example = "Alice A", min_length = 2, max_length = 100)]
    pub full_name: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "secret1", min_length = 6)]
    pub password: String,
}

/// Signup acknowledgment
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    #[schema(example = "User created successfully")]
    pub message: String,
    pub identity_id: String,
}

/// Login request DTO
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "secret1")]
    pub password: String,
}

/// A freshly issued access/refresh pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Login response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: IdentityResponse,
    pub access_token: String,
    pub refresh_token: String,
}
