//! Error types for the permissions module.

use thiserror::Error;

use crate::gate::Denial;
use crate::role::Role;

/// Errors that can occur during permission operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermsError {
    /// Roles cannot be granted to the null principal.
    #[error("cannot grant {0} to the null principal")]
    NullPrincipal(Role),

    /// A capability check failed.
    #[error("permission denied: {0}")]
    Denied(Denial),
}

impl From<Denial> for PermsError {
    fn from(denial: Denial) -> Self {
        PermsError::Denied(denial)
    }
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
