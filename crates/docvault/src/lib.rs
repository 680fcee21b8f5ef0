//! # docvault
//!
//! Permissioned, versioned document records with role-based access control
//! and a validator-certification workflow.
//!
//! ## Overview
//!
//! A document is a hash-chained, append-only list of versions plus a small
//! head state: one owner, a lifecycle status and the signatures collected so
//! far. File bytes never pass through docvault; versions only carry the
//! content identifier of an external content-addressed store.
//!
//! - **Roles**: editors append versions, validators certify, readers read.
//!   The owner holds every capability except validation implicitly.
//! - **Lifecycle**: `Draft` on creation, `Active` after the first signature,
//!   `Suspended` on the owner's request, `Revoked` for good.
//! - **Certification**: either many validators sign once each, or a single
//!   certifier fills the only slot ([`LedgerConfig::certification`]).
//! - **Audit**: every successful mutation emits exactly one [`AuditEvent`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docvault::{Ledger, LedgerConfig, Principal, Role};
//! use docvault::store::SqliteStore;
//!
//! async fn example() -> docvault::Result<()> {
//!     let store = SqliteStore::open("docvault.db")?;
//!     let ledger = Ledger::new(store, LedgerConfig::default());
//!
//!     let owner = Principal::from("registry-office");
//!     let id = ledger.create(&owner, "bafy...", "initial scan").await?;
//!
//!     let notary = Principal::from("notary");
//!     ledger.grant(id, &owner, &notary, Role::Validator).await?;
//!     ledger.sign(id, &notary).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `docvault::core` - Data model (DocumentId, Version, DocumentStatus, ...)
//! - `docvault::perms` - Roles, permission registry and authorization gate
//! - `docvault::store` - Storage abstraction, SQLite and in-memory stores

pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod query;

mod locks;

// Re-export component crates
pub use docvault_core as core;
pub use docvault_perms as perms;
pub use docvault_store as store;

// Re-export main types for convenience
pub use config::LedgerConfig;
pub use error::{ErrorKind, LedgerError, Result};
pub use events::{AuditEvent, AuditRecord, BroadcastSink, EventSink, MemorySink, TracingSink};
pub use ledger::Ledger;
pub use query::{DocumentSummary, SignatureStatus, ValidatorSignature};

// Re-export commonly used component types
pub use docvault_core::{
    CertificationMode, Clock, ContentId, DocumentId, DocumentStatus, ManualClock, Principal,
    SignatureRecord, SystemClock, Version,
};
pub use docvault_perms::{Capability, Decision, Denial, Role};
