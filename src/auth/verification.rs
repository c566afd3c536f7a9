// Token verification service
// Signature and expiry via the codec, then the persisted "current token" binding

use std::sync::Arc;
use tracing::debug;

use crate::auth::{
    error::AuthError,
    session_store::SessionStore,
    token::{Claims, TokenCodec, TokenKind},
};

pub struct TokenVerifier {
    codec: Arc<TokenCodec>,
    store: SessionStore,
}

impl TokenVerifier {
    pub fn new(codec: Arc<TokenCodec>, store: SessionStore) -> Self {
        Self { codec, store }
    }

    /// Validate a presented access token against the identity's current one
    pub async fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, TokenKind::Access).await
    }

    /// Validate a presented refresh token against the identity's current one
    pub async fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify(token, TokenKind::Refresh).await
    }

    async fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        let claims = self.codec.decode(token)?;

        if claims.token_kind != expected {
            return Err(AuthError::WrongTokenKind);
        }

        let identity = self
            .store
            .find_by_id(&claims.identity_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        let current = match expected {
            TokenKind::Access => identity.current_access_token.as_deref(),
            TokenKind::Refresh => identity.current_refresh_token.as_deref(),
        };

        // Byte-exact: any later issuance supersedes this string
        if current != Some(token) {
            debug!("Superseded {:?} token presented for identity {}", expected, claims.identity_id);
            return Err(AuthError::StaleToken);
        }

        Ok(claims)
    }
}
