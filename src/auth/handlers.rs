// HTTP handlers for authentication endpoints

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use std::sync::Arc;

use crate::auth::{
    error::AuthError,
    middleware::{bearer_token, AuthenticatedUser},
    models::{
        IdentityResponse, LoginRequest, LoginResponse, SignupRequest, SignupResponse, TokenPair,
    },
    service::AuthService,
};

/// Register a new user
/// POST /signup
#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = SignupResponse),
        (status = 400, description = "Field constraints violated"),
        (status = 409, description = "Username already exists")
    ),
    tag = "auth"
)]
pub async fn signup_handler(
    State(service): State<Arc<AuthService>>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AuthError> {
    let response = service.signup(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login a user
/// POST /login
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; previous tokens are now stale", body = LoginResponse),
        (status = 401, description = "Invalid username or password")
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(service): State<Arc<AuthService>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    service.login(request).await.map(Json)
}

/// Rotate the refresh token presented as a bearer credential
/// POST /refresh
#[utoipa::path(
    post,
    path = "/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "must_relogin, stale or invalid refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(service): State<Arc<AuthService>>,
    headers: HeaderMap,
) -> Result<Json<TokenPair>, AuthError> {
    let refresh_token = bearer_token(&headers)?;
    service.refresh(refresh_token).await.map(Json)
}

/// Get current user information (protected endpoint)
/// GET /me
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The caller's identity", body = IdentityResponse),
        (status = 401, description = "missing_credential, expired, invalid or stale access token")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me_handler(
    State(service): State<Arc<AuthService>>,
    user: AuthenticatedUser,
) -> Result<Json<IdentityResponse>, AuthError> {
    service.get_identity(&user.identity_id).await.map(Json)
}
