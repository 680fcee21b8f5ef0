//! Store trait: the abstract interface for document persistence.
//!
//! This trait allows the ledger to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use docvault_core::{Blake3Hash, DocumentId, DocumentRecord, Principal, Version};
use docvault_perms::PermissionRegistry;

use crate::error::Result;

/// Result of inserting a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// Version was appended.
    Inserted,
    /// The exact same version is already stored at that index.
    AlreadyExists,
    /// Conflict: a different version occupies that index.
    Conflict {
        /// Digest of the stored version.
        existing: Blake3Hash,
    },
}

/// Head state of one document: everything except its history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub record: DocumentRecord,
    pub permissions: PermissionRegistry,
}

impl StoredDocument {
    /// A new document with an empty registry.
    pub fn new(record: DocumentRecord) -> Self {
        Self {
            record,
            permissions: PermissionRegistry::new(),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.record.id
    }
}

/// The Store trait: async interface for document persistence.
///
/// All methods are async to support both blocking (SQLite) and async backends.
/// For SQLite, work runs on `spawn_blocking` to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Atomic head updates**: `update_document` replaces owner, status,
///   certification and grants together, or not at all.
/// - **Append-only history**: versions are inserted at `index == count` only; there
///   is no update or delete.
/// - **No locking policy**: serializing operations per document is the caller's job.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Document Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Allocate the next document id. Ids are never handed out twice.
    async fn allocate_document_id(&self) -> Result<DocumentId>;

    /// Insert a new document together with its initial version.
    ///
    /// Fails with `DocumentExists` if the id is taken.
    async fn insert_document(&self, document: &StoredDocument, initial: &Version) -> Result<()>;

    /// Get a document's head state.
    async fn get_document(&self, id: DocumentId) -> Result<Option<StoredDocument>>;

    /// Replace a document's head state.
    ///
    /// Fails with `NotFound` if the document does not exist.
    async fn update_document(&self, document: &StoredDocument) -> Result<()>;

    /// List document ids, optionally filtered by owner, in ascending order.
    async fn list_documents(&self, owner: Option<&Principal>) -> Result<Vec<DocumentId>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Version Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a version.
    ///
    /// # Returns
    /// - `Inserted` if `version.index` equals the current count.
    /// - `AlreadyExists` if the identical version is stored at that index.
    /// - `Conflict` if a different version is stored at that index.
    ///
    /// An index beyond the current count fails with `NonContiguousVersion`.
    async fn insert_version(&self, id: DocumentId, version: &Version) -> Result<InsertResult>;

    /// Get the version at `index`.
    async fn get_version(&self, id: DocumentId, index: u64) -> Result<Option<Version>>;

    /// Get the most recent version.
    async fn latest_version(&self, id: DocumentId) -> Result<Option<Version>>;

    /// Number of versions stored for a document (0 if unknown).
    async fn version_count(&self, id: DocumentId) -> Result<u64>;

    /// Get versions with `start <= index <= end`, ordered by index.
    async fn get_versions_range(&self, id: DocumentId, start: u64, end: u64)
        -> Result<Vec<Version>>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// The complete history of a document, in append order.
    fn history(
        &self,
        id: DocumentId,
    ) -> impl std::future::Future<Output = Result<Vec<Version>>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn history(&self, id: DocumentId) -> Result<Vec<Version>> {
        let count = self.version_count(id).await?;
        if count == 0 {
            return Ok(Vec::new());
        }
        self.get_versions_range(id, 0, count - 1).await
    }
}
