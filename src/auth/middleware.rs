// Authentication middleware for protected routes

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::auth::{error::AuthError, service::AuthService, token::Claims};

/// Caller identity attached to the request once the gate passes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub identity_id: String,
    pub username: String,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            identity_id: claims.identity_id,
            username: claims.username,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present on routes behind `require_access_token`
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::MissingCredential)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::Malformed)?;

    // A bare "Bearer" scheme carries no credential at all
    let token = match value.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim(),
        _ => return Err(AuthError::Malformed),
    };

    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

/// Gate middleware: verifies the bearer access token and attaches the caller.
///
/// Downstream handlers can take either `AuthenticatedUser` or the full
/// decoded `Extension<Claims>`.
pub async fn require_access_token(
    State(service): State<Arc<AuthService>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let endpoint = request.uri().path().to_string();
    let token = bearer_token(request.headers())?.to_string();
    let claims = service.authenticate(&token).await?;

    debug!("Gate passed: identity_id={}, endpoint={}", claims.identity_id, endpoint);
    request
        .extensions_mut()
        .insert(AuthenticatedUser::from(claims.clone()));
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
