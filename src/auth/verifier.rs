use std::sync::Arc;

use async_trait::async_trait;

use super::{AuthError, Identity, TokenKeys};
use crate::database::UserStore;

/// Turns a raw credential into the identity it proves
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<Identity, AuthError>;
}

/// Verifies HS256 tokens and confirms the named user still exists
pub struct JwtVerifier {
    keys: Arc<TokenKeys>,
    users: Arc<dyn UserStore>,
}

impl JwtVerifier {
    pub fn new(keys: Arc<TokenKeys>, users: Arc<dyn UserStore>) -> Self {
        Self { keys, users }
    }
}

#[async_trait]
impl CredentialVerifier for JwtVerifier {
    async fn verify(&self, credential: &str) -> Result<Identity, AuthError> {
        let claims = self.keys.verify(credential)?;
        let username = claims.user.username;

        if !self.users.user_exists(&username).await? {
            return Err(AuthError::UnknownUser(username));
        }
        Ok(Identity::new(username))
    }
}
