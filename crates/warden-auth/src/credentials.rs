//! Credential verification
//!
//! Turns a username/password pair into an [`Identity`] that can be handed
//! to the token codec.

use async_trait::async_trait;
use tracing::{debug, info};
use warden_db::Database;

use crate::error::AuthError;
use crate::identity::Identity;
use crate::password::verify_password;

/// Valid Argon2 hash that matches no password; verified for unknown users
/// so the response time does not reveal whether the account exists.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

/// Authenticates raw credentials
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError>;
}

/// Verifies credentials against the user store
#[derive(Clone)]
pub struct UserStoreVerifier {
    db: Database,
}

impl UserStoreVerifier {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialVerifier for UserStoreVerifier {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Identity, AuthError> {
        debug!("Verifying credentials for user: {}", username);

        let user = self.db.get_user_with_authorities(username).await?;

        let Some(user) = user else {
            // Only spends the same hashing time as a real check.
            verify_password(password, DUMMY_HASH).ok();
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.activated {
            info!("Rejected login for deactivated user: {}", user.username);
            return Err(AuthError::UserNotActivated);
        }

        Ok(Identity::new(user.username, user.authorities))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::hash_password;
    use tempfile::TempDir;
    use warden_db::{NewUser, ROLE_ADMIN, ROLE_USER};

    async fn verifier_with_user(activated: bool) -> (TempDir, UserStoreVerifier) {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("auth.db").display());
        let db = Database::new(&url).await.unwrap();

        db.insert_user(NewUser {
            username: "alice".to_string(),
            password_hash: hash_password("wonderland").unwrap(),
            nickname: "Alice".to_string(),
            activated,
            authorities: vec![ROLE_USER.to_string(), ROLE_ADMIN.to_string()],
        })
        .await
        .unwrap();

        (dir, UserStoreVerifier::new(db))
    }

    #[tokio::test]
    async fn test_valid_credentials_yield_identity() {
        let (_dir, verifier) = verifier_with_user(true).await;

        let identity = verifier.authenticate("alice", "wonderland").await.unwrap();
        assert_eq!(identity, Identity::new("alice", [ROLE_ADMIN, ROLE_USER]));
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let (_dir, verifier) = verifier_with_user(true).await;

        let err = verifier.authenticate("alice", "looking-glass").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unknown_user_rejected() {
        let (_dir, verifier) = verifier_with_user(true).await;

        let err = verifier.authenticate("bob", "wonderland").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_deactivated_user_rejected() {
        let (_dir, verifier) = verifier_with_user(false).await;

        let err = verifier.authenticate("alice", "wonderland").await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotActivated));
    }
}
