// Record store backends for identity records

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::auth::{error::AuthError, models::Identity};

/// Opaque record store keyed by identity
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a new record; a taken username yields `DuplicateUsername`
    async fn insert(&self, identity: &Identity) -> Result<(), AuthError>;

    async fn find_by_id(&self, identity_id: &str) -> Result<Option<Identity>, AuthError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AuthError>;

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError>;

    /// Overwrite the current token pair.
    /// Returns `false` when no record matches `identity_id`.
    async fn update_tokens(
        &self,
        identity_id: &str,
        access_token: &str,
        refresh_token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AuthError>;

    async fn list(&self) -> Result<Vec<Identity>, AuthError>;
}

const IDENTITY_COLUMNS: &str = "identity_id, username, full_name, password_hash, \
     current_access_token, current_refresh_token, created_at, updated_at";

/// Postgres-backed identity store
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    /// Create a new PgIdentityStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn insert(&self, identity: &Identity) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO identities (identity_id, username, full_name, password_hash,
                                    current_access_token, current_refresh_token,
                                    created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&identity.identity_id)
        .bind(&identity.username)
        .bind(&identity.full_name)
        .bind(&identity.password_hash)
        .bind(&identity.current_access_token)
        .bind(&identity.current_refresh_token)
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // The unique constraint closes the check-then-insert window
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::DuplicateUsername;
                }
            }
            AuthError::from(e)
        })?;

        Ok(())
    }

    async fn find_by_id(&self, identity_id: &str) -> Result<Option<Identity>, AuthError> {
        let identity = sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE identity_id = $1"
        ))
        .bind(identity_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AuthError> {
        let identity = sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        let exists: Option<bool> =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM identities WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists.unwrap_or(false))
    }

    async fn update_tokens(
        &self,
        identity_id: &str,
        access_token: &str,
        refresh_token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE identities
            SET current_access_token = $1,
                current_refresh_token = $2,
                updated_at = $3
            WHERE identity_id = $4
            "#,
        )
        .bind(access_token)
        .bind(refresh_token)
        .bind(updated_at)
        .bind(identity_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<Identity>, AuthError> {
        let identities = sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities ORDER BY created_at, username"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(identities)
    }
}

/// In-process identity store used when no database is configured
#[derive(Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<HashMap<String, Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn insert(&self, identity: &Identity) -> Result<(), AuthError> {
        let mut identities = self.identities.write().await;
        if identities.values().any(|i| i.username == identity.username) {
            return Err(AuthError::DuplicateUsername);
        }
        identities.insert(identity.identity_id.clone(), identity.clone());
        Ok(())
    }

    async fn find_by_id(&self, identity_id: &str) -> Result<Option<Identity>, AuthError> {
        Ok(self.identities.read().await.get(identity_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, AuthError> {
        Ok(self
            .identities
            .read()
            .await
            .values()
            .find(|i| i.username == username)
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self
            .identities
            .read()
            .await
            .values()
            .any(|i| i.username == username))
    }

    async fn update_tokens(
        &self,
        identity_id: &str,
        access_token: &str,
        refresh_token: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, AuthError> {
        let mut identities = self.identities.write().await;
        match identities.get_mut(identity_id) {
            Some(identity) => {
                identity.current_access_token = Some(access_token.to_string());
                identity.current_refresh_token = Some(refresh_token.to_string());
                identity.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<Identity>, AuthError> {
        let mut identities: Vec<Identity> =
            self.identities.read().await.values().cloned().collect();
        identities.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.username.cmp(&b.username))
        });
        Ok(identities)
    }
}

#[cfg(test)]
pub(crate) fn sample_identity(identity_id: &str, username: &str) -> Identity {
    let now = Utc::now();
    Identity {
        identity_id: identity_id.to_string(),
        username: username.to_string(),
        full_name: format!("{username} Example"),
        password_hash: "hash".to_string(),
        current_access_token: None,
        current_refresh_token: None,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryIdentityStore::new();
        let identity = sample_identity("id-1", "alice");
        store.insert(&identity).await.unwrap();

        assert_eq!(store.find_by_id("id-1").await.unwrap(), Some(identity.clone()));
        assert_eq!(store.find_by_username("alice").await.unwrap(), Some(identity));
        assert!(store.username_exists("alice").await.unwrap());
        assert!(!store.username_exists("bob").await.unwrap());
        assert_eq!(store.find_by_id("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_username() {
        let store = InMemoryIdentityStore::new();
        store.insert(&sample_identity("id-1", "alice")).await.unwrap();

        let result = store.insert(&sample_identity("id-2", "alice")).await;
        assert!(matches!(result, Err(AuthError::DuplicateUsername)));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_tokens_overwrites_pair() {
        let store = InMemoryIdentityStore::new();
        store.insert(&sample_identity("id-1", "alice")).await.unwrap();

        assert!(store.update_tokens("id-1", "a1", "r1", Utc::now()).await.unwrap());
        assert!(store.update_tokens("id-1", "a2", "r2", Utc::now()).await.unwrap());

        let identity = store.find_by_id("id-1").await.unwrap().unwrap();
        assert_eq!(identity.current_access_token.as_deref(), Some("a2"));
        assert_eq!(identity.current_refresh_token.as_deref(), Some("r2"));
    }

    #[tokio::test]
    async fn test_update_tokens_unknown_identity() {
        let store = InMemoryIdentityStore::new();
        assert!(!store.update_tokens("nobody", "a", "r", Utc::now()).await.unwrap());
    }
}
