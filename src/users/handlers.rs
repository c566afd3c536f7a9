// HTTP handlers for the user directory

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::auth::{AuthError, AuthService, AuthenticatedUser, IdentityResponse};

/// List all registered users
/// GET /users
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All identities", body = Vec<IdentityResponse>),
        (status = 401, description = "Gate rejected the access token")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users_handler(
    State(service): State<Arc<AuthService>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<IdentityResponse>>, AuthError> {
    tracing::debug!("Identity {} listing users", user.identity_id);
    service.list_identities().await.map(Json)
}

/// Get a single user by identity id
/// GET /users/:identity_id
#[utoipa::path(
    get,
    path = "/users/{identity_id}",
    params(
        ("identity_id" = String, Path, description = "Identity ID")
    ),
    responses(
        (status = 200, description = "Identity found", body = IdentityResponse),
        (status = 401, description = "Gate rejected the access token"),
        (status = 404, description = "No identity with that id")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user_handler(
    State(service): State<Arc<AuthService>>,
    Path(identity_id): Path<String>,
) -> Result<Json<IdentityResponse>, AuthError> {
    service.get_identity(&identity_id).await.map(Json)
}
