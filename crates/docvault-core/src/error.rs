//! Error types for docvault core.

use thiserror::Error;

use crate::types::DocumentId;

/// Core errors that can occur while building or decoding model values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid document id: {0}")]
    InvalidDocumentId(u64),

    #[error("unknown document status code: {0}")]
    UnknownStatus(u8),

    #[error("unknown certification mode: {0}")]
    UnknownCertificationMode(String),

    #[error("encoding error: {0}")]
    EncodingError(String),
}

/// Errors found while verifying a version history.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("document {0} has no versions")]
    EmptyHistory(DocumentId),

    #[error("version belongs to document {got}, expected {expected}")]
    WrongDocument { expected: DocumentId, got: DocumentId },

    #[error("invalid version index: expected {expected}, got {got}")]
    InvalidIndex { expected: u64, got: u64 },

    #[error("version {index} does not link to its predecessor")]
    BrokenLink { index: u64 },

    #[error("version {index} digest does not match its contents")]
    DigestMismatch { index: u64 },

    #[error("version {index} timestamp goes backwards")]
    TimestampRegression { index: u64 },

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<CoreError> for ValidationError {
    fn from(e: CoreError) -> Self {
        ValidationError::Encoding(e.to_string())
    }
}
