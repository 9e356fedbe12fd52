pub mod password;
pub mod token;
pub mod verifier;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::database::DatabaseError;

pub use token::{Claims, TokenKeys, TokenUser};
pub use verifier::{CredentialVerifier, JwtVerifier};

/// The username a request was authenticated as. Resolved per request, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self(username.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,

    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("credential refers to unknown user '{0}'")]
    UnknownUser(String),

    #[error("token generation failed: {0}")]
    TokenGeneration(String),

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}
