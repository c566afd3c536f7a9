// Token issuance service
// Builds fresh access/refresh pairs; persistence is a separate explicit step

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::TokenPair,
    session_store::SessionStore,
    token::{Claims, TokenCodec, TokenKind},
};

/// Token lifetimes in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access_secs: i64,
    pub refresh_secs: i64,
}

impl Default for TokenLifetimes {
    /// Access tokens expire in 15 minutes, refresh tokens in 7 days
    fn default() -> Self {
        Self {
            access_secs: 900,
            refresh_secs: 604_800,
        }
    }
}

pub struct TokenIssuer {
    codec: Arc<TokenCodec>,
    store: SessionStore,
    lifetimes: TokenLifetimes,
}

impl TokenIssuer {
    pub fn new(codec: Arc<TokenCodec>, store: SessionStore, lifetimes: TokenLifetimes) -> Self {
        Self {
            codec,
            store,
            lifetimes,
        }
    }

    fn issue(
        &self,
        identity_id: &str,
        username: &str,
        token_kind: TokenKind,
        now: i64,
    ) -> Result<String, AuthError> {
        let ttl = match token_kind {
            TokenKind::Access => self.lifetimes.access_secs,
            TokenKind::Refresh => self.lifetimes.refresh_secs,
        };

        let expires_at = now.checked_add(ttl).ok_or_else(|| {
            AuthError::TokenGenerationError(format!("{ttl}s lifetime overflows the expiry timestamp"))
        })?;

        self.codec.issue(&Claims {
            identity_id: identity_id.to_string(),
            username: username.to_string(),
            token_kind,
            expires_at,
            issued_at: now,
            jti: Uuid::new_v4().to_string(),
        })
    }

    /// Generate both access and refresh tokens. Does not touch the store.
    pub fn issue_pair(&self, identity_id: &str, username: &str) -> Result<TokenPair, AuthError> {
        let now = Utc::now().timestamp();

        Ok(TokenPair {
            access_token: self.issue(identity_id, username, TokenKind::Access, now)?,
            refresh_token: self.issue(identity_id, username, TokenKind::Refresh, now)?,
        })
    }

    /// Make `pair` the identity's only valid pair, superseding the previous one
    pub async fn persist_pair(&self, identity_id: &str, pair: &TokenPair) -> Result<(), AuthError> {
        self.store.persist_pair(identity_id, pair).await
    }
}
