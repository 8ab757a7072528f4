//! Manage session tokens.
//!
//! Sessions are stateless: a signed assertion of identity with a bounded
//! lifetime. There is no revocation list; a token is valid until natural
//! expiry.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};

pub const TOKEN_TYPE: &str = "Bearer";
pub const DAY_IN_SECONDS: u64 = 24 * 60 * 60;

/// Pieces of information asserted on a session token.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Claims {
    /// Identifies the expiration time on or after which the token must not
    /// be accepted for processing.
    pub exp: u64,
    /// Identifies the time at which the token was issued.
    pub iat: u64,
    /// Identifies the instance that issued the token.
    pub iss: String,
    /// Customer ID.
    pub sub: String,
}

/// Mints and validates signed session tokens.
///
/// Immutable for the process lifetime; safe for unsynchronized concurrent
/// reads.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl TokenManager {
    /// Create a new [`TokenManager`] from a process-wide secret.
    pub fn new(issuer: &str, secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            issuer: issuer.to_owned(),
            ttl,
        }
    }

    /// Session lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn now() -> Result<u64> {
        Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| ServerError::Internal {
                details: err.to_string(),
            })?
            .as_secs())
    }

    /// Create a new session token bound to a customer.
    pub fn create(&self, customer_id: &str) -> Result<String> {
        let time = Self::now()?;
        let header = Header::new(self.algorithm);
        let claims = Claims {
            exp: time + self.ttl.as_secs(),
            iat: time,
            iss: self.issuer.clone(),
            sub: customer_id.to_owned(),
        };

        encode(&header, &claims, &self.encoding_key).map_err(|err| {
            ServerError::Internal {
                details: err.to_string(),
            }
        })
    }

    /// Decode and check a token.
    ///
    /// Signature mismatch, malformed token and elapsed expiry are all
    /// reported uniformly as [`ServerError::Unauthorized`].
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| ServerError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(secret: &str) -> TokenManager {
        TokenManager::new(
            "https://fitness.example.com/",
            secret,
            Duration::from_secs(30 * DAY_IN_SECONDS),
        )
    }

    #[test]
    fn test_create_and_decode() {
        let token = manager("secret");
        let jwt = token.create("2ea8c840-1b3e-4a22-9767-a35a5bd735cd").unwrap();

        let claims = token.decode(&jwt).unwrap();
        assert_eq!(claims.sub, "2ea8c840-1b3e-4a22-9767-a35a5bd735cd");
        assert_eq!(claims.iss, "https://fitness.example.com/");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_signature_mismatch() {
        let jwt = manager("secret").create("customer").unwrap();

        assert!(matches!(
            manager("another-secret").decode(&jwt),
            Err(ServerError::Unauthorized)
        ));
    }

    #[test]
    fn test_malformed_token() {
        assert!(matches!(
            manager("secret").decode("not.a.token"),
            Err(ServerError::Unauthorized)
        ));
    }

    #[test]
    fn test_elapsed_expiry() {
        let token = manager("secret");

        // Forge a token whose expiry is already in the past.
        let time = TokenManager::now().unwrap();
        let claims = Claims {
            exp: time - 60,
            iat: time - 120,
            iss: "https://fitness.example.com/".into(),
            sub: "customer".into(),
        };
        let jwt = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(matches!(
            token.decode(&jwt),
            Err(ServerError::Unauthorized)
        ));
    }
}
