// Authentication service - business logic layer
// Composes hashing, issuance, verification and the session store into the user-facing flows

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    issuance::{TokenIssuer, TokenLifetimes},
    models::{
        Identity, IdentityResponse, LoginRequest, LoginResponse, SignupRequest, SignupResponse,
        TokenPair,
    },
    password::CredentialHasher,
    session_store::SessionStore,
    token::{Claims, TokenCodec},
    verification::TokenVerifier,
};

/// Authentication service coordinating all auth operations
pub struct AuthService {
    store: SessionStore,
    hasher: Arc<dyn CredentialHasher>,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
}

impl AuthService {
    /// Create a new AuthService.
    ///
    /// The codec carries the process-wide signing key; issuer and verifier
    /// share it so every token in the process agrees on one secret.
    pub fn new(
        store: SessionStore,
        hasher: Arc<dyn CredentialHasher>,
        codec: Arc<TokenCodec>,
        lifetimes: TokenLifetimes,
    ) -> Self {
        Self {
            issuer: TokenIssuer::new(codec.clone(), store.clone(), lifetimes),
            verifier: TokenVerifier::new(codec, store.clone()),
            store,
            hasher,
        }
    }

    /// Register a new identity.
    ///
    /// 1. Validates field constraints
    /// 2. Checks username uniqueness
    /// 3. Hashes the password
    /// 4. Issues an initial token pair and stores it with the record
    ///
    /// The uniqueness check and the insert are separate store calls; the
    /// store-level constraint is what ultimately rejects a racing duplicate.
    pub async fn signup(&self, request: SignupRequest) -> Result<SignupResponse, AuthError> {
        request.validate()?;
        debug!("Signup requested for username {}", request.username);

        if self.store.username_exists(&request.username).await? {
            return Err(AuthError::DuplicateUsername);
        }

        let password_hash = self.hash_password(request.password).await?;
        let identity_id = Uuid::new_v4().to_string();
        let pair = self.issuer.issue_pair(&identity_id, &request.username)?;
        let now = Utc::now();

        let identity = Identity {
            identity_id: identity_id.clone(),
            username: request.username,
            full_name: request.full_name,
            password_hash,
            current_access_token: Some(pair.access_token),
            current_refresh_token: Some(pair.refresh_token),
            created_at: now,
            updated_at: now,
        };
        self.store.create_identity(&identity).await?;

        info!("Created identity {} for username {}", identity_id, identity.username);
        Ok(SignupResponse {
            message: "User created successfully".to_string(),
            identity_id,
        })
    }

    /// Login with username and password, replacing any previously issued pair
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        request.validate()?;

        // Unknown username and wrong password are the same outcome
        let Some(identity) = self.store.find_by_username(&request.username).await? else {
            warn!("Login failed: unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .verify_password(identity.password_hash.clone(), request.password)
            .await?
        {
            warn!("Login failed: password mismatch for identity {}", identity.identity_id);
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issuer.issue_pair(&identity.identity_id, &identity.username)?;
        self.issuer.persist_pair(&identity.identity_id, &pair).await?;

        // Re-read so the returned record reflects the write
        let identity = self
            .store
            .find_by_id(&identity.identity_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        info!("Identity {} logged in", identity.identity_id);
        Ok(LoginResponse {
            user: identity.into(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    /// Rotate a refresh token into a brand-new pair.
    ///
    /// The presented refresh token is superseded by the write, so it is single-use.
    /// An expired refresh token surfaces as `MustRelogin`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .verifier
            .verify_refresh(refresh_token)
            .await
            .map_err(|e| match e {
                AuthError::TokenExpired => AuthError::MustRelogin,
                other => other,
            })?;

        let pair = self.issuer.issue_pair(&claims.identity_id, &claims.username)?;
        self.issuer.persist_pair(&claims.identity_id, &pair).await?;

        info!("Rotated token pair for identity {}", claims.identity_id);
        Ok(pair)
    }

    /// Gate check applied before every protected operation
    pub async fn authenticate(&self, access_token: &str) -> Result<Claims, AuthError> {
        if access_token.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        self.verifier.verify_access(access_token).await
    }

    /// Get a single identity record by id
    pub async fn get_identity(&self, identity_id: &str) -> Result<IdentityResponse, AuthError> {
        self.store
            .find_by_id(identity_id)
            .await?
            .map(IdentityResponse::from)
            .ok_or_else(|| AuthError::UserNotFound(identity_id.to_string()))
    }

    /// List every identity record
    pub async fn list_identities(&self) -> Result<Vec<IdentityResponse>, AuthError> {
        let identities = self.store.list_identities().await?;
        debug!("Listing {} identities", identities.len());
        Ok(identities.into_iter().map(IdentityResponse::from).collect())
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::PasswordHashError(e.to_string()))?
    }

    async fn verify_password(&self, digest: String, password: String) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
            .await
            .map_err(|e| AuthError::PasswordHashError(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) fn test_service() -> AuthService {
    use crate::auth::{password::test_hasher, repository::InMemoryIdentityStore};
    use std::time::Duration;

    AuthService::new(
        SessionStore::new(Arc::new(InMemoryIdentityStore::new()), Duration::from_secs(5)),
        Arc::new(test_hasher()),
        Arc::new(TokenCodec::new(TEST_SECRET)),
        TokenLifetimes::default(),
    )
}

#[cfg(test)]
pub(crate) const TEST_SECRET: &str = "test_secret_key_for_testing_purposes";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::test_hasher;
    use crate::auth::token::TokenKind;

    fn signup_request(username: &str, full_name: &str, password: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            full_name: full_name.to_string(),
            password: password.to_string(),
        }
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    async fn signed_up_alice(service: &AuthService) -> SignupResponse {
        service
            .signup(signup_request("alice", "Alice A", "secret1"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_signup_then_duplicate() {
        let service = test_service();
        let response = signed_up_alice(&service).await;
        assert_eq!(response.message, "User created successfully");
        assert!(!response.identity_id.is_empty());

        let result = service
            .signup(signup_request("alice", "Another Alice", "secret2"))
            .await;
        assert!(matches!(result, Err(AuthError::DuplicateUsername)));
    }

    #[tokio::test]
    async fn test_signup_stores_verifiable_hash_and_initial_pair() {
        let service = test_service();
        let response = signed_up_alice(&service).await;

        let record = service
            .store
            .find_by_id(&response.identity_id)
            .await
            .unwrap()
            .unwrap();
        let hasher = test_hasher();
        assert_ne!(record.password_hash, "secret1");
        assert!(hasher.verify(&record.password_hash, "secret1"));
        assert!(!hasher.verify(&record.password_hash, "secret2"));

        let access = record.current_access_token.unwrap();
        let claims = service.authenticate(&access).await.unwrap();
        assert_eq!(claims.identity_id, response.identity_id);
        assert!(record.current_refresh_token.is_some());
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let service = test_service();

        let cases = [
            signup_request("a", "Alice A", "secret1"),
            signup_request(&"a".repeat(101), "Alice A", "secret1"),
            signup_request("alice", "A", "secret1"),
            signup_request("alice", "   ", "secret1"),
            signup_request("    ", "Alice A", "secret1"),
            signup_request("alice", "Alice A", "short"),
        ];
        for request in cases {
            let result = service.signup(request).await;
            assert!(matches!(result, Err(AuthError::ValidationError(_))));
        }

        assert!(service.list_identities().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_signup_accepts_username_with_inner_space() {
        let service = test_service();

        let response = service
            .signup(signup_request("alice smith", "Alice Smith", "secret1"))
            .await
            .unwrap();
        let stored = service.get_identity(&response.identity_id).await.unwrap();
        assert_eq!(stored.username, "alice smith");

        service.login(login_request("alice smith", "secret1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_login_returns_record_without_hash_and_tokens() {
        let service = test_service();
        let signup = signed_up_alice(&service).await;

        let response = service.login(login_request("alice", "secret1")).await.unwrap();
        assert_eq!(response.user.identity_id, signup.identity_id);
        assert_eq!(response.user.username, "alice");
        assert_eq!(response.user.full_name, "Alice A");

        let json = serde_json::to_value(&response.user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("current_access_token").is_none());
    }

    #[tokio::test]
    async fn test_login_errors_are_indistinguishable() {
        let service = test_service();
        signed_up_alice(&service).await;

        let wrong_password = service.login(login_request("alice", "wrong")).await.unwrap_err();
        let unknown_user = service.login(login_request("nobody", "secret1")).await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(wrong_password.reason_code(), unknown_user.reason_code());
        assert_eq!(wrong_password.status_code(), unknown_user.status_code());
    }

    #[tokio::test]
    async fn test_second_login_supersedes_first() {
        let service = test_service();
        signed_up_alice(&service).await;

        let t1 = service.login(login_request("alice", "secret1")).await.unwrap();
        assert!(service.authenticate(&t1.access_token).await.is_ok());

        let t2 = service.login(login_request("alice", "secret1")).await.unwrap();
        assert_ne!(t1.access_token, t2.access_token);

        assert!(matches!(
            service.authenticate(&t1.access_token).await,
            Err(AuthError::StaleToken)
        ));
        assert!(service.authenticate(&t2.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_is_single_use() {
        let service = test_service();
        signed_up_alice(&service).await;
        let login = service.login(login_request("alice", "secret1")).await.unwrap();

        let rotated = service.refresh(&login.refresh_token).await.unwrap();
        assert!(service.authenticate(&rotated.access_token).await.is_ok());

        assert!(matches!(
            service.refresh(&login.refresh_token).await,
            Err(AuthError::StaleToken)
        ));
        assert!(matches!(
            service.authenticate(&login.access_token).await,
            Err(AuthError::StaleToken)
        ));
    }

    #[tokio::test]
    async fn test_expired_refresh_requires_relogin() {
        let service = test_service();
        let signup = signed_up_alice(&service).await;
        let now = Utc::now().timestamp();

        let expired = TokenCodec::new(TEST_SECRET)
            .issue(&Claims {
                identity_id: signup.identity_id.clone(),
                username: "alice".to_string(),
                token_kind: TokenKind::Refresh,
                expires_at: now - 1,
                issued_at: now - 604_801,
                jti: Uuid::new_v4().to_string(),
            })
            .unwrap();

        assert!(matches!(
            service.refresh(&expired).await,
            Err(AuthError::MustRelogin)
        ));
    }

    #[tokio::test]
    async fn test_gate_reports_expired_distinct_from_invalid() {
        let service = test_service();
        let signup = signed_up_alice(&service).await;
        let now = Utc::now().timestamp();
        let claims = Claims {
            identity_id: signup.identity_id,
            username: "alice".to_string(),
            token_kind: TokenKind::Access,
            expires_at: now - 1,
            issued_at: now - 901,
            jti: Uuid::new_v4().to_string(),
        };

        let expired = TokenCodec::new(TEST_SECRET).issue(&claims).unwrap();
        let err = service.authenticate(&expired).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
        assert_eq!(err.reason_code(), "expired");

        let forged = TokenCodec::new("not-the-secret").issue(&claims).unwrap();
        let err = service.authenticate(&forged).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
        assert_eq!(err.reason_code(), "invalid");
    }

    #[tokio::test]
    async fn test_gate_missing_credential() {
        let service = test_service();
        assert!(matches!(
            service.authenticate("").await,
            Err(AuthError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_directory_lookups() {
        let service = test_service();
        let alice = signed_up_alice(&service).await;
        service
            .signup(signup_request("bob", "Bob B", "secret2"))
            .await
            .unwrap();

        let all = service.list_identities().await.unwrap();
        assert_eq!(all.len(), 2);

        let found = service.get_identity(&alice.identity_id).await.unwrap();
        assert_eq!(found.username, "alice");

        assert!(matches!(
            service.get_identity("missing").await,
            Err(AuthError::UserNotFound(_))
        ));
    }
}
