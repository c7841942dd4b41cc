//! Authentication primitives
//!
//! - [`password`]: Argon2id hashing and verification
//! - [`credentials`]: user registration and login checks
//! - [`jwt`]: access token issuing and validation
//! - [`middleware`]: bearer header parsing and the request [`middleware::AuthContext`]

pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod password;
