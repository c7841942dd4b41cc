//! Data-layer error type
//!
//! Owner-scoped operations in [`crate::models`] return [`StoreError`]. A row
//! that does not exist and a row that belongs to another user both surface as
//! [`StoreError::NotFound`]; callers cannot tell them apart.

/// Error type for owner-scoped data operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row matches (owner, id)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Uniqueness or referential-integrity violation
    #[error("{0}")]
    Conflict(String),

    /// A referenced entity does not exist for this owner
    #[error("Invalid {field}: {message}")]
    InvalidReference {
        field: &'static str,
        message: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result alias for data operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Returns true if the error is a unique-constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Returns true if the error is a foreign-key violation
pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Returns the name of the violated constraint, if any
pub fn violated_constraint(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}
