//! Version history validation: digest and chain checks.

use crate::error::ValidationError;
use crate::hash::Blake3Hash;
use crate::types::DocumentId;
use crate::version::Version;

/// Validate a single version against its predecessor.
///
/// This performs:
/// - Index check (dense, 0-based)
/// - Link check (`prev_digest` equals the predecessor's digest)
/// - Timestamp check (never earlier than the predecessor)
/// - Digest recomputation
pub fn validate_link(
    document_id: DocumentId,
    prev: Option<&Version>,
    version: &Version,
) -> Result<(), ValidationError> {
    let (expected_index, expected_prev) = match prev {
        Some(p) => (p.index + 1, p.digest),
        None => (0, Blake3Hash::ZERO),
    };

    if version.index != expected_index {
        return Err(ValidationError::InvalidIndex {
            expected: expected_index,
            got: version.index,
        });
    }

    if version.prev_digest != expected_prev {
        return Err(ValidationError::BrokenLink {
            index: version.index,
        });
    }

    if let Some(p) = prev {
        if version.timestamp < p.timestamp {
            return Err(ValidationError::TimestampRegression {
                index: version.index,
            });
        }
    }

    if !version.verify_digest(document_id)? {
        return Err(ValidationError::DigestMismatch {
            index: version.index,
        });
    }

    Ok(())
}

/// Validate a full history, in append order.
///
/// An empty history is invalid: every created document has at least one version.
pub fn validate_history(document_id: DocumentId, versions: &[Version]) -> Result<(), ValidationError> {
    if versions.is_empty() {
        return Err(ValidationError::EmptyHistory(document_id));
    }

    let mut prev: Option<&Version> = None;
    for version in versions {
        validate_link(document_id, prev, version)?;
        prev = Some(version);
    }

    Ok(())
}
