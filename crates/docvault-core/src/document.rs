//! Document: owner, lifecycle status and certification of one versioned record.
//!
//! The version history is stored separately (append-only); a [`DocumentRecord`]
//! holds only the mutable head state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::certification::Certification;
use crate::error::CoreError;
use crate::types::{DocumentId, Principal};

/// Lifecycle status of a document.
///
/// `Revoked` is terminal: no transition ever leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DocumentStatus {
    /// Freshly created, not yet certified.
    Draft = 0,
    /// Certified by at least one validator.
    Active = 1,
    /// Put on hold by the owner.
    Suspended = 2,
    /// Withdrawn for good. Still readable.
    Revoked = 3,
}

impl DocumentStatus {
    /// Convert to u8 for storage.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Result<Self, CoreError> {
        match value {
            0 => Ok(Self::Draft),
            1 => Ok(Self::Active),
            2 => Ok(Self::Suspended),
            3 => Ok(Self::Revoked),
            other => Err(CoreError::UnknownStatus(other)),
        }
    }

    /// Whether the status is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Revoked)
    }

    /// Whether new versions may be appended.
    pub fn accepts_versions(self) -> bool {
        !self.is_terminal()
    }

    /// Whether validators may sign.
    pub fn accepts_signatures(self) -> bool {
        !self.is_terminal()
    }

    /// Whether the owner may suspend from this status.
    pub fn can_suspend(self) -> bool {
        matches!(self, Self::Draft | Self::Active)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Revoked => "revoked",
        };
        f.write_str(s)
    }
}

/// Head state of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// The document identifier.
    pub id: DocumentId,

    /// The single owner. Implicitly holds every capability.
    pub owner: Principal,

    /// Current lifecycle status.
    pub status: DocumentStatus,

    /// Signatures collected in the current certification round.
    pub certification: Certification,

    /// When the document was created (Unix ms).
    pub created_at: i64,

    /// When the head state last changed (Unix ms).
    pub updated_at: i64,
}

impl DocumentRecord {
    /// Create a record for a new document in `Draft`.
    pub fn new(id: DocumentId, owner: Principal, now: i64) -> Self {
        Self {
            id,
            owner,
            status: DocumentStatus::Draft,
            certification: Certification::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `principal` owns this document.
    pub fn is_owner(&self, principal: &Principal) -> bool {
        !principal.is_null() && &self.owner == principal
    }

    /// Whether the document has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.status.is_terminal()
    }

    /// Record a head-state change.
    pub fn touch(&mut self, now: i64) {
        self.updated_at = self.updated_at.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_u8_roundtrip() {
        for status in [
            DocumentStatus::Draft,
            DocumentStatus::Active,
            DocumentStatus::Suspended,
            DocumentStatus::Revoked,
        ] {
            assert_eq!(DocumentStatus::from_u8(status.to_u8()).unwrap(), status);
        }
        assert!(DocumentStatus::from_u8(9).is_err());
    }

    #[test]
    fn test_revoked_blocks_edits_and_signing() {
        assert!(!DocumentStatus::Revoked.accepts_versions());
        assert!(!DocumentStatus::Revoked.accepts_signatures());
        assert!(DocumentStatus::Suspended.accepts_versions());
        assert!(DocumentStatus::Suspended.accepts_signatures());
    }

    #[test]
    fn test_suspend_sources() {
        assert!(DocumentStatus::Draft.can_suspend());
        assert!(DocumentStatus::Active.can_suspend());
        assert!(!DocumentStatus::Suspended.can_suspend());
        assert!(!DocumentStatus::Revoked.can_suspend());
    }

    #[test]
    fn test_new_record_is_draft() {
        let rec = DocumentRecord::new(DocumentId::FIRST, Principal::from("owner"), 10);
        assert_eq!(rec.status, DocumentStatus::Draft);
        assert!(rec.is_owner(&Principal::from("owner")));
        assert!(!rec.is_owner(&Principal::from("other")));
        assert!(rec.certification.is_empty());
    }

    #[test]
    fn test_touch_never_goes_backwards() {
        let mut rec = DocumentRecord::new(DocumentId::FIRST, Principal::from("owner"), 10);
        rec.touch(5);
        assert_eq!(rec.updated_at, 10);
        rec.touch(20);
        assert_eq!(rec.updated_at, 20);
    }
}
