//! Identity collaborator
//!
//! Token verification happens in an external identity service; the job
//! layer only needs "which user is this". Credential storage is out of
//! scope by design, so the boundary is a single-method trait.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{AppError, Result};

/// A user identity confirmed by the external verifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedUser {
    pub user_id: String,
    pub email: Option<String>,
}

/// Identity token verification boundary
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a bearer token and resolve the user behind it
    async fn verify(&self, token: &str) -> Result<VerifiedUser>;
}

/// Fixed token → user table for tests and local development
#[derive(Debug, Default)]
pub struct StaticTokenVerifier {
    users: HashMap<String, VerifiedUser>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        self.users.insert(
            token.into(),
            VerifiedUser {
                user_id,
                email: None,
            },
        );
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedUser> {
        self.users
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Validation("Invalid identity token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_token_resolves_its_user() {
        let verifier = StaticTokenVerifier::new().with_user("tok-1", "user-a");
        let user = verifier.verify("tok-1").await.unwrap();
        assert_eq!(user.user_id, "user-a");
    }

    #[tokio::test]
    async fn unknown_token_is_rejected() {
        let verifier = StaticTokenVerifier::new();
        let err = verifier.verify("nope").await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
