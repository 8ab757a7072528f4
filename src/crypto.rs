//! Credential hashing and verification.

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::config::Argon2 as ArgonConfig;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),
}

/// Password manager that uses Argon2id and PHC string format for hashing
/// and verification.
///
/// Plaintext passwords are never stored, logged nor returned.
pub struct PasswordManager {
    params: Params,
}

impl PasswordManager {
    /// Create a new [`PasswordManager`].
    pub fn new(config: Option<ArgonConfig>) -> Result<Self, CryptoError> {
        let config = config.unwrap_or_default();

        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2 {
        Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.clone(),
        )
    }

    /// Hash password using Argon2id with a random salt.
    pub fn hash_password(
        &self,
        password: impl AsRef<[u8]>,
    ) -> Result<String, CryptoError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(password.as_ref(), &salt)
            .map_err(|e| CryptoError::Argon2(e.to_string()))?;

        Ok(hash.to_string())
    }

    /// Verify password against a PHC string.
    ///
    /// A malformed PHC string is reported as a plain mismatch so that a
    /// caller cannot distinguish it from a wrong password.
    pub fn verify_password(
        &self,
        password: impl AsRef<[u8]>,
        phc_hash: &str,
    ) -> bool {
        let Ok(parsed) = PasswordHash::new(phc_hash) else {
            return false;
        };

        self.argon2()
            .verify_password(password.as_ref(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap_manager() -> PasswordManager {
        PasswordManager::new(Some(ArgonConfig {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
            hash_length: 32,
        }))
        .unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let pwd = cheap_manager();

        let hash = pwd.hash_password("StRong_Pa§$W0rD").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(pwd.verify_password("StRong_Pa§$W0rD", &hash));
        assert!(!pwd.verify_password("stRong_Pa§$W0rD", &hash));
    }

    #[test]
    fn test_random_salt() {
        let pwd = cheap_manager();

        let first = pwd.hash_password("hunter22").unwrap();
        let second = pwd.hash_password("hunter22").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_phc() {
        let pwd = cheap_manager();
        assert!(!pwd.verify_password("hunter22", "not-a-phc-string"));
    }
}
