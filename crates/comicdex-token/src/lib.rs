//! Mints and verifies HS256 bearer tokens carrying a username subject,
//! implementing [`comicdex_core::interfaces::TokenManager`].

use chrono::Duration;
use comicdex_core::error::{Error, Result};
use comicdex_core::interfaces::TokenManager;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    nbf: i64,
    exp: i64,
}

/// Issues and verifies JWTs signed with a shared secret.
pub struct JwtTokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokenManager {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }
}

impl TokenManager for JwtTokenManager {
    fn token(&self, username: &str) -> Result<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|err| {
            log::error!("[ token.token ] failed to mint token for '{username}': {err}");
            Error::internal(err)
        })
    }

    fn verify(&self, token: &str) -> Result<String> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|err| {
            log::debug!("[ token.verify ] failed to parse token: {err}");
            Error::BadToken
        })?;

        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_minted_token() {
        let manager = JwtTokenManager::new(b"test-secret", Duration::minutes(5));
        let token = manager.token("alice").unwrap();
        let subject = manager.verify(&token).unwrap();
        assert_eq!(subject, "alice");
    }

    #[test]
    fn rejects_a_token_signed_with_a_different_secret() {
        let a = JwtTokenManager::new(b"secret-a", Duration::minutes(5));
        let b = JwtTokenManager::new(b"secret-b", Duration::minutes(5));

        let token = a.token("alice").unwrap();
        let err = b.verify(&token).unwrap_err();
        assert!(matches!(err, Error::BadToken));
    }

    #[test]
    fn rejects_an_expired_token() {
        let manager = JwtTokenManager::new(b"test-secret", Duration::seconds(-1));
        let token = manager.token("alice").unwrap();
        let err = manager.verify(&token).unwrap_err();
        assert!(matches!(err, Error::BadToken));
    }

    #[test]
    fn rejects_a_malformed_token() {
        let manager = JwtTokenManager::new(b"test-secret", Duration::minutes(5));
        let err = manager.verify("not-a-jwt").unwrap_err();
        assert!(matches!(err, Error::BadToken));
    }
}
