// Password hashing capability
// Argon2id behind a small trait so the orchestrator never depends on the algorithm

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::auth::error::AuthError;

/// One-way password hashing and verification
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password with a fresh random salt
    fn hash(&self, plaintext: &str) -> Result<String, AuthError>;

    /// Check a plaintext password against a stored digest.
    /// A malformed digest is reported as a mismatch.
    fn verify(&self, digest: &str, plaintext: &str) -> bool;
}

/// Argon2id cost parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Number of passes
    pub time_cost: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: Params::DEFAULT_M_COST,
            time_cost: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl PasswordConfig {
    fn to_params(&self) -> Result<Params, AuthError> {
        Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| AuthError::PasswordHashError(e.to_string()))
    }
}

/// Argon2id password hasher producing PHC strings
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// Create a hasher, rejecting cost parameters argon2 does not accept
    pub fn new(config: &PasswordConfig) -> Result<Self, AuthError> {
        Ok(Self {
            params: config.to_params()?,
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswordHashError(e.to_string()))
    }

    fn verify(&self, digest: &str, plaintext: &str) -> bool {
        // Parameters are read back from the PHC string itself
        match PasswordHash::new(digest) {
            Ok(parsed) => Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> Argon2Hasher {
    // Cheap parameters keep the suite fast
    Argon2Hasher::new(&PasswordConfig {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hasher = test_hasher();
        let hash = hasher.hash("secret1").unwrap();

        assert!(hasher.verify(&hash, "secret1"));
        assert!(!hasher.verify(&hash, "secret2"));
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        let hasher = test_hasher();
        let hash1 = hasher.hash("SamePassword").unwrap();
        let hash2 = hasher.hash("SamePassword").unwrap();

        assert_ne!(hash1, hash2);
        assert!(hasher.verify(&hash1, "SamePassword"));
        assert!(hasher.verify(&hash2, "SamePassword"));
    }

    #[test]
    fn test_malformed_digest_is_a_mismatch() {
        let hasher = test_hasher();

        assert!(!hasher.verify("invalid-hash-format", "password"));
        assert!(!hasher.verify("", "password"));
        assert!(!hasher.verify("$argon2id$v=19$garbage", "password"));
    }

    #[test]
    fn test_custom_config_is_encoded_in_hash() {
        let hasher = Argon2Hasher::new(&PasswordConfig {
            memory_cost: 2048,
            time_cost: 2,
            parallelism: 1,
        })
        .unwrap();
        let hash = hasher.hash("TestPassword").unwrap();

        assert!(hash.contains("m=2048"));
        assert!(hash.contains("t=2"));
        assert!(hasher.verify(&hash, "TestPassword"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let result = Argon2Hasher::new(&PasswordConfig {
            memory_cost: 1,
            time_cost: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(AuthError::PasswordHashError(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_hash_verifies_only_its_own_password(
            password in "[a-zA-Z0-9!@#]{6,24}",
            other in "[a-zA-Z0-9!@#]{6,24}"
        ) {
            let hasher = test_hasher();
            let hash = hasher.hash(&password).unwrap();

            prop_assert!(hasher.verify(&hash, &password));
            if other != password {
                prop_assert!(!hasher.verify(&hash, &other));
            }
        }
    }
}
