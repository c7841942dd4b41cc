//! Password hashing with Argon2id
//!
//! Hashes are stored in PHC string format, so the parameters used at hash time
//! travel with the hash and verification needs no configuration.
//!
//! Both functions are CPU and memory heavy. Async callers should run them on
//! the blocking pool (see [`crate::auth::credentials`]).
//!
//! # Example
//!
//! ```
//! use taskdesk_shared::auth::password::{hash_password, verify_password};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let hash = hash_password("correct horse battery")?;
//! assert!(verify_password("correct horse battery", &hash)?);
//! assert!(!verify_password("wrong horse battery", &hash)?);
//! # Ok(())
//! # }
//! ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, ParamsBuilder, Version,
};

/// Memory cost in KiB (19 MiB)
const MEMORY_COST_KIB: u32 = 19 * 1024;

/// Number of passes
const TIME_COST: u32 = 2;

/// Parallel lanes
const PARALLELISM: u32 = 1;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Stored hash could not be parsed
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    /// Verification failed for a reason other than a wrong password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(MEMORY_COST_KIB)
        .t_cost(TIME_COST)
        .p_cost(PARALLELISM)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with a fresh random salt
///
/// Returns a PHC string such as `$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// Returns `Ok(false)` for a wrong password. The comparison is constant-time.
///
/// # Errors
///
/// `PasswordError::InvalidHash` if `hash` is not a PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}
