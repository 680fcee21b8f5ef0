//! # docvault Core
//!
//! Pure data model for docvault: documents, versions, certification state and the
//! canonical encoding that makes version history tamper-evident.
//!
//! This crate contains no I/O, no storage and no locking. Everything here is plain
//! computation over values; the `docvault` crate drives it.
//!
//! ## Key Types
//!
//! - [`DocumentId`] - Sequential, positive document identity
//! - [`Principal`] - Opaque, externally authenticated caller identity
//! - [`ContentId`] - Opaque reference into an external content-addressed store
//! - [`Version`] - One immutable entry of a document's append-only history
//! - [`DocumentRecord`] - Owner, status and certification of a document
//! - [`Certification`] - Which validators have signed, under a [`CertificationMode`]
//!
//! ## Digest Chain
//!
//! Each version is sealed with a Blake3 digest over its canonical CBOR encoding and the
//! digest of the version before it. See [`canonical`] and [`validation`].

pub mod canonical;
pub mod certification;
pub mod clock;
pub mod document;
pub mod error;
pub mod hash;
pub mod types;
pub mod validation;
pub mod version;

pub use canonical::canonical_version_bytes;
pub use certification::{Certification, CertificationMode, SignRefusal, SignatureRecord};
pub use clock::{Clock, ManualClock, SystemClock};
pub use document::{DocumentRecord, DocumentStatus};
pub use error::{CoreError, ValidationError};
pub use hash::Blake3Hash;
pub use types::{ContentId, DocumentId, Principal};
pub use validation::{validate_history, validate_link};
pub use version::{Version, VersionDraft};
