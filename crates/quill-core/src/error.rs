//! Domain-level error types.

use thiserror::Error;

/// Errors returned by the content repository.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {entity_type} with slug '{slug}'")]
    NotFound {
        entity_type: &'static str,
        slug: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] RepoError),
}

impl DomainError {
    pub fn not_found(entity_type: &'static str, slug: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            slug: slug.into(),
        }
    }

    /// True for a slug miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Store-level errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query execution failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}
