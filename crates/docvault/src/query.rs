//! Read-only views returned by the query surface.

use docvault_core::{CertificationMode, DocumentId, DocumentStatus, Principal, SignatureRecord};
use serde::{Deserialize, Serialize};

/// Summary of a document for readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub owner: Principal,
    pub status: DocumentStatus,
    /// Note of the latest version.
    pub latest_note: String,
    pub version_count: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Whether one validator has signed the current round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSignature {
    pub validator: Principal,
    /// Signing time, `None` if not signed.
    pub signed_at: Option<i64>,
}

impl ValidatorSignature {
    pub fn has_signed(&self) -> bool {
        self.signed_at.is_some()
    }
}

/// Certification state of a document, for its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureStatus {
    pub mode: CertificationMode,
    pub status: DocumentStatus,
    /// Current validators in grant order, with their signature if any.
    pub validators: Vec<ValidatorSignature>,
    /// Every signature of the round in signing order, including those of
    /// principals whose validator role was later revoked.
    pub signatures: Vec<SignatureRecord>,
}

impl SignatureStatus {
    /// Number of signatures collected.
    pub fn signed_count(&self) -> usize {
        self.signatures.len()
    }

    /// Validators that have not signed yet.
    pub fn pending(&self) -> impl Iterator<Item = &Principal> {
        self.validators
            .iter()
            .filter(|v| !v.has_signed())
            .map(|v| &v.validator)
    }
}
