//! Error definitions.
use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, MapError>;

/// Errors reported by the hash map engines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Returned by lookups and removals when the requested key is not stored in the map.
    #[error("KeyError: given key does not exist in map")]
    KeyNotFound,

    /// A constructor parameter is outside of its valid domain.
    #[error("invalid {parameter}: {reason}")]
    InvalidArgument {
        /// Name of the rejected parameter
        parameter: &'static str,
        /// Human readable explanation
        reason: String,
    },
}

impl MapError {
    /// Shorthand for building an [`MapError::InvalidArgument`].
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument { parameter, reason: reason.into() }
    }
}
