use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::AuthError;
use crate::config::SecurityConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUser {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user: TokenUser,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(username: &str, ttl_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            user: TokenUser {
                username: username.to_string(),
            },
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        }
    }
}

/// HS256 signing and verification keys derived from the configured secret
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenKeys {
    pub fn new(security: &SecurityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(security.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(security.jwt_secret.as_bytes()),
            validation,
            ttl_secs: security.token_ttl_secs,
        }
    }

    pub fn issue(&self, username: &str) -> Result<String, AuthError> {
        self.encode_claims(&Claims::new(username, self.ttl_secs))
    }

    pub fn encode_claims(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Checks signature and expiry. Does not consult the user store.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidCredential(e.to_string()))
    }
}
