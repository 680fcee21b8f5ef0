//! Version: one immutable entry of a document's append-only history.
//!
//! A version only carries metadata. The content itself lives in an external
//! content-addressed store and is referenced by [`ContentId`]. Once sealed a
//! version is never edited; the only way to change a document is to append.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_version_bytes;
use crate::error::CoreError;
use crate::hash::Blake3Hash;
use crate::types::{ContentId, DocumentId, Principal};

/// Domain separator for version digests.
pub const VERSION_DOMAIN: &[u8] = b"docvault-version-v0:";

/// A sealed version record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Position in the history (0-based, dense).
    pub index: u64,

    /// Reference into the external content store.
    pub content_id: ContentId,

    /// Who submitted this version.
    pub author: Principal,

    /// Append time (Unix milliseconds).
    pub timestamp: i64,

    /// Free-text annotation.
    pub note: String,

    /// Digest of the previous version ([`Blake3Hash::ZERO`] for index 0).
    pub prev_digest: Blake3Hash,

    /// Blake3 over the domain separator and the canonical encoding.
    pub digest: Blake3Hash,
}

impl Version {
    /// Recompute the digest this version should carry.
    pub fn compute_digest(&self, document_id: DocumentId) -> Result<Blake3Hash, CoreError> {
        let bytes = canonical_version_bytes(document_id, self)?;
        Ok(Blake3Hash::hash_parts(&[VERSION_DOMAIN, &bytes]))
    }

    /// Check that the stored digest matches the contents.
    pub fn verify_digest(&self, document_id: DocumentId) -> Result<bool, CoreError> {
        Ok(self.compute_digest(document_id)? == self.digest)
    }

    /// Whether this is the initial version of its document.
    pub fn is_initial(&self) -> bool {
        self.index == 0
    }
}

/// The caller-supplied part of a version, before it is sealed into a history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDraft {
    pub content_id: ContentId,
    pub author: Principal,
    pub note: String,
}

impl VersionDraft {
    /// Create a draft.
    pub fn new(
        content_id: impl Into<ContentId>,
        author: Principal,
        note: impl Into<String>,
    ) -> Self {
        Self {
            content_id: content_id.into(),
            author,
            note: note.into(),
        }
    }

    /// Seal the draft at `index`, linking it to `prev_digest`.
    pub fn seal(
        self,
        document_id: DocumentId,
        index: u64,
        timestamp: i64,
        prev_digest: Blake3Hash,
    ) -> Result<Version, CoreError> {
        let mut version = Version {
            index,
            content_id: self.content_id,
            author: self.author,
            timestamp,
            note: self.note,
            prev_digest,
            digest: Blake3Hash::ZERO,
        };
        version.digest = version.compute_digest(document_id)?;
        Ok(version)
    }

    /// Seal the draft as the first version of a document.
    pub fn seal_initial(self, document_id: DocumentId, timestamp: i64) -> Result<Version, CoreError> {
        self.seal(document_id, 0, timestamp, Blake3Hash::ZERO)
    }

    /// Seal the draft as the successor of `prev`.
    pub fn seal_after(
        self,
        document_id: DocumentId,
        prev: &Version,
        timestamp: i64,
    ) -> Result<Version, CoreError> {
        self.seal(document_id, prev.index + 1, timestamp, prev.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(cid: &str, note: &str) -> VersionDraft {
        VersionDraft::new(cid, Principal::from("alice"), note)
    }

    #[test]
    fn test_seal_initial() {
        let v = draft("Qm1", "v1").seal_initial(DocumentId::FIRST, 1000).unwrap();
        assert_eq!(v.index, 0);
        assert!(v.is_initial());
        assert_eq!(v.prev_digest, Blake3Hash::ZERO);
        assert!(v.verify_digest(DocumentId::FIRST).unwrap());
    }

    #[test]
    fn test_seal_after_links() {
        let v0 = draft("Qm1", "v1").seal_initial(DocumentId::FIRST, 1000).unwrap();
        let v1 = draft("Qm2", "fix").seal_after(DocumentId::FIRST, &v0, 2000).unwrap();
        assert_eq!(v1.index, 1);
        assert_eq!(v1.prev_digest, v0.digest);
        assert_ne!(v1.digest, v0.digest);
    }

    #[test]
    fn test_tampered_note_fails_verification() {
        let mut v = draft("Qm1", "v1").seal_initial(DocumentId::FIRST, 1000).unwrap();
        v.note = "rewritten".into();
        assert!(!v.verify_digest(DocumentId::FIRST).unwrap());
    }

    #[test]
    fn test_digest_bound_to_document() {
        let v = draft("Qm1", "v1").seal_initial(DocumentId::FIRST, 1000).unwrap();
        assert!(!v.verify_digest(DocumentId::FIRST.next()).unwrap());
    }
}
