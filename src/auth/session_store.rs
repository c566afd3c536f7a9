// Session store adapter
// Bounds every record store call with a timeout and owns the token-pair binding

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::{
    error::AuthError,
    models::{Identity, TokenPair},
    repository::IdentityStore,
};

/// Reads and writes identity records, including the single current token pair.
///
/// The pair overwrite is last-writer-wins: two concurrent logins for the same
/// identity may land out of order, and nothing here serialises them.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn IdentityStore>,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn IdentityStore>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, AuthError>
    where
        F: Future<Output = Result<T, AuthError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Store operation '{}' timed out after {:?}", operation, self.timeout);
                Err(AuthError::StoreTimeout)
            }
        }
    }

    pub async fn create_identity(&self, identity: &Identity) -> Result<(), AuthError> {
        self.bounded("create_identity", self.backend.insert(identity))
            .await
    }

    pub async fn find_by_id(&self, identity_id: &str) -> Result<Option<Identity>, AuthError> {
        self.bounded("find_by_id", self.backend.find_by_id(identity_id))
            .await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AuthError> {
        self.bounded("find_by_username", self.backend.find_by_username(username))
            .await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        self.bounded("username_exists", self.backend.username_exists(username))
            .await
    }

    pub async fn list_identities(&self) -> Result<Vec<Identity>, AuthError> {
        self.bounded("list_identities", self.backend.list()).await
    }

    /// Overwrite the identity's current access and refresh tokens.
    /// Fails with `IdentityNotFound` when the record does not exist.
    pub async fn persist_pair(&self, identity_id: &str, pair: &TokenPair) -> Result<(), AuthError> {
        let updated = self
            .bounded(
                "persist_pair",
                self.backend.update_tokens(
                    identity_id,
                    &pair.access_token,
                    &pair.refresh_token,
                    Utc::now(),
                ),
            )
            .await?;

        if !updated {
            return Err(AuthError::IdentityNotFound);
        }

        debug!("Persisted new token pair for identity {}", identity_id);
        Ok(())
    }
}
