//! The authenticated identity that every engine call is scoped to.
//!
//! There is no ambient "current user". A caller presents a credential to an `Authenticator`,
//! receives an `AuthContext`, and passes it into each operation.

use crate::db::Db;
use crate::error::{ErrorType, PubError};
use crate::model::OwnerId;
use crate::Result;
use async_trait::async_trait;
use tracing::debug;

/// Proof that a credential was checked. It can only be constructed inside this crate, by an
/// `Authenticator`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct AuthContext {
    owner_id: OwnerId,
    owner_name: String,
}

impl AuthContext {
    pub(crate) fn new(owner_id: OwnerId, owner_name: impl Into<String>) -> Self {
        Self {
            owner_id,
            owner_name: owner_name.into(),
        }
    }

    pub fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }
}

/// Turns a bearer credential into an `AuthContext`.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// # Errors
    /// An `Unauthorized` error if the token is blank or unknown.
    async fn authenticate(&self, token: &str) -> Result<AuthContext>;
}

/// Resolves opaque tokens issued by `owner add` against the database.
#[derive(Debug, Clone)]
pub struct TokenAuthenticator {
    db: Db,
}

impl TokenAuthenticator {
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Authenticator for TokenAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<AuthContext> {
        let token = token.trim();
        if token.is_empty() {
            return Err(unauthorized());
        }
        match self.db.owner_by_token(token).await? {
            Some((owner_id, name)) => {
                debug!("Authenticated owner {owner_id}");
                Ok(AuthContext::new(owner_id, name))
            }
            None => Err(unauthorized()),
        }
    }
}

fn unauthorized() -> crate::Error {
    PubError::new(ErrorType::Unauthorized, "Invalid or missing credentials").into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::find_pub_error;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_token_resolves_owner() {
        let env = TestEnv::new().await;
        let auth = env
            .config()
            .authenticate(Some(env.token()))
            .await
            .unwrap();
        assert_eq!(auth.owner_id(), env.owner_id());
        assert_eq!(auth.owner_name(), "test-owner");
    }

    #[tokio::test]
    async fn test_bad_tokens_are_unauthorized() {
        let env = TestEnv::new().await;
        let authenticator = TokenAuthenticator::new(env.db().clone());
        for token in ["", "   ", "not-a-token"] {
            let e = authenticator.authenticate(token).await.unwrap_err();
            let p = find_pub_error(&e).unwrap();
            assert_eq!(p.error_type(), ErrorType::Unauthorized);
            assert_eq!(p.status(), 401);
        }
    }
}
