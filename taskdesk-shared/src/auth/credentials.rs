//! Credential store
//!
//! Registers users with an Argon2id password hash and verifies login
//! attempts. A wrong password and an unknown username produce the same
//! [`CredentialError::InvalidCredentials`], and both run one hash
//! verification, so neither the error nor the response time reveals which
//! usernames exist.

use super::password::{hash_password, verify_password, PasswordError};
use crate::error::{is_unique_violation, violated_constraint};
use crate::models::user::{CreateUser, User};
use sqlx::PgPool;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Error type for registration and login
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Another account already uses this username
    #[error("Username is already taken")]
    UsernameTaken,

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Hashing failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Hash verified against when the username does not exist
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("taskdesk-dummy-password").ok())
        .as_deref()
}

async fn hash_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::HashError(format!("Hashing task failed: {}", e)))?
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::VerifyError(format!("Verification task failed: {}", e)))?
}

/// Spends one verification on the dummy hash, off the async workers
///
/// The first call also computes the dummy hash there.
async fn verify_against_dummy(password: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || match dummy_hash() {
        Some(hash) => verify_password(&password, hash),
        None => Ok(false),
    })
    .await
    .map_err(|e| PasswordError::VerifyError(format!("Verification task failed: {}", e)))?
}

/// Persists users and checks their passwords
#[derive(Debug, Clone)]
pub struct CredentialStore {
    pool: PgPool,
}

impl CredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Registers a new user
    ///
    /// # Errors
    ///
    /// `CredentialError::UsernameTaken` if the username exists. The unique
    /// constraint decides, so two concurrent registrations cannot both win.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, CredentialError> {
        let password_hash = hash_blocking(password.to_string()).await?;

        let result = User::create(
            &self.pool,
            CreateUser {
                username: username.to_string(),
                password_hash,
            },
        )
        .await;

        match result {
            Ok(user) => {
                info!(user_id = %user.id, username = %user.username, "User registered");
                Ok(user)
            }
            Err(e)
                if is_unique_violation(&e)
                    && violated_constraint(&e).map_or(true, |c| c == USERNAME_CONSTRAINT) =>
            {
                debug!(username, "Registration rejected, username taken");
                Err(CredentialError::UsernameTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Checks a username and password
    ///
    /// # Errors
    ///
    /// `CredentialError::InvalidCredentials` for an unknown username and for a
    /// wrong password alike.
    pub async fn verify(&self, username: &str, password: &str) -> Result<User, CredentialError> {
        let user = User::find_by_username(&self.pool, username).await?;

        let Some(user) = user else {
            let _ = verify_against_dummy(password.to_string()).await;
            debug!(username, "Login failed");
            return Err(CredentialError::InvalidCredentials);
        };

        match verify_blocking(password.to_string(), user.password_hash.clone()).await {
            Ok(true) => {
                debug!(user_id = %user.id, "Login succeeded");
                Ok(user)
            }
            Ok(false) => {
                debug!(username, "Login failed");
                Err(CredentialError::InvalidCredentials)
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unusable");
                Err(CredentialError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_hash_is_a_valid_hash() {
        let hash = dummy_hash().expect("dummy hash should be computed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(!verify_password("anything", hash).unwrap());
    }

    #[test]
    fn test_dummy_hash_is_computed_once() {
        let first = dummy_hash().unwrap();
        let second = dummy_hash().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[tokio::test]
    async fn test_dummy_verification_never_matches() {
        assert!(!verify_against_dummy("taskdesk".to_string()).await.unwrap());
        assert!(!verify_against_dummy(String::new()).await.unwrap());
        assert!(dummy_hash().is_some());
    }

    #[tokio::test]
    async fn test_blocking_helpers_roundtrip() {
        let hash = hash_blocking("password123".to_string()).await.unwrap();
        assert!(verify_blocking("password123".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_blocking("password124".to_string(), hash).await.unwrap());
    }

    #[test]
    fn test_error_messages_do_not_leak_cause() {
        assert_eq!(
            CredentialError::InvalidCredentials.to_string(),
            "Invalid username or password"
        );
    }
}
