//! Error types for the Crux protocol layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the Crux domain layer.
///
/// Transition failures have their own type
/// ([`crate::machine::TransitionError`]) because callers branch on those
/// categories; this enum covers the remaining domain-level failures.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CruxError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound { entity_type: String, id: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CruxError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<String> for CruxError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, CruxError>`.
pub type Result<T> = std::result::Result<T, CruxError>;
