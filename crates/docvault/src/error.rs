//! Error types for the Ledger.

use std::fmt;

use docvault_core::{CoreError, DocumentId, ValidationError};
use docvault_perms::{Denial, PermsError};
use docvault_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Ledger operations.
///
/// Every failure leaves the document untouched and emits no event.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Unknown document id.
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// The document exists but has no version at that index.
    #[error("document {id} has no version {index}")]
    VersionNotFound { id: DocumentId, index: u64 },

    /// Capability check failed.
    #[error("unauthorized: {0}")]
    Unauthorized(Denial),

    /// The document is revoked and the operation is not allowed on it.
    #[error("document {0} is revoked")]
    DocumentRevoked(DocumentId),

    /// The single certification slot is filled; the document cannot leave `Active`
    /// except by revocation.
    #[error("document {0} is certified and cannot be suspended")]
    CertificationFinal(DocumentId),

    /// The certification rule refused the signature.
    #[error("document {0} already signed")]
    AlreadySigned(DocumentId),

    /// Bad caller input (null principal, empty content id).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The stored history failed verification.
    #[error("history of document {id} is corrupted: {source}")]
    HistoryCorrupted {
        id: DocumentId,
        #[source]
        source: ValidationError,
    },

    /// The store refused to append because the slot was taken.
    #[error("version {index} of document {id} is already taken")]
    VersionConflict { id: DocumentId, index: u64 },

    /// Encoding error while sealing a version.
    #[error("encoding error: {0}")]
    Encoding(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl From<Denial> for LedgerError {
    fn from(denial: Denial) -> Self {
        LedgerError::Unauthorized(denial)
    }
}

impl From<PermsError> for LedgerError {
    fn from(e: PermsError) -> Self {
        match e {
            PermsError::Denied(denial) => LedgerError::Unauthorized(denial),
            PermsError::NullPrincipal(_) => LedgerError::InvalidArgument(e.to_string()),
        }
    }
}

/// Caller-facing classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    InvalidState,
    AlreadySigned,
    InvalidArgument,
    /// Storage or integrity failure; not the caller's fault.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not_found",
            Self::Unauthorized => "unauthorized",
            Self::InvalidState => "invalid_state",
            Self::AlreadySigned => "already_signed",
            Self::InvalidArgument => "invalid_argument",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl LedgerError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::VersionNotFound { .. } => ErrorKind::NotFound,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::DocumentRevoked(_) | Self::CertificationFinal(_) => ErrorKind::InvalidState,
            Self::AlreadySigned(_) => ErrorKind::AlreadySigned,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::HistoryCorrupted { .. }
            | Self::VersionConflict { .. }
            | Self::Encoding(_)
            | Self::Store(_) => ErrorKind::Internal,
        }
    }

    /// The denial reason, for `Unauthorized` errors.
    pub fn denial(&self) -> Option<Denial> {
        match self {
            Self::Unauthorized(denial) => Some(*denial),
            _ => None,
        }
    }
}

/// Result type for Ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
