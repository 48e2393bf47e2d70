//! Custom error types for the common library
//!
//! This module defines application-specific error types that can be used
//! throughout the application.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[from] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A referenced row is missing, disabled, or not in the required state
    #[error("{0}")]
    NotFound(String),

    /// The write would break a data invariant
    #[error("{0}")]
    Invalid(String),
}

impl DatabaseError {
    /// Shorthand for a missing `entity` with the given id
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} {} not found", entity, id))
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DatabaseError::not_found("product", 42);
        assert_eq!(err.to_string(), "product 42 not found");
    }

    #[test]
    fn test_query_error_from_sqlx() {
        let err: DatabaseError = SqlxError::RowNotFound.into();
        assert!(matches!(err, DatabaseError::Query(_)));
        assert!(err.to_string().starts_with("Database query error"));
    }
}
