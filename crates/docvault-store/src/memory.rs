//! In-memory implementation of the Store trait.
//!
//! Same semantics as SQLite, no persistence. Useful for tests and for
//! embedding docvault in a process that persists elsewhere.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use docvault_core::{DocumentId, Principal, Version};

use crate::error::{Result, StoreError};
use crate::traits::{InsertResult, Store, StoredDocument};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Last allocated id (0 = none yet).
    last_id: u64,

    /// Head state by document.
    documents: HashMap<DocumentId, StoredDocument>,

    /// Histories by document, index == position.
    versions: HashMap<DocumentId, Vec<Version>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn allocate_document_id(&self) -> Result<DocumentId> {
        let mut inner = self.write()?;
        inner.last_id += 1;
        DocumentId::new(inner.last_id)
            .ok_or_else(|| StoreError::InvalidData("document id counter overflow".into()))
    }

    async fn insert_document(&self, document: &StoredDocument, initial: &Version) -> Result<()> {
        let mut inner = self.write()?;
        let id = document.id();

        if inner.documents.contains_key(&id) {
            return Err(StoreError::DocumentExists(id));
        }
        if initial.index != 0 {
            return Err(StoreError::NonContiguousVersion {
                document_id: id,
                expected: 0,
                got: initial.index,
            });
        }

        inner.last_id = inner.last_id.max(id.get());
        inner.documents.insert(id, document.clone());
        inner.versions.insert(id, vec![initial.clone()]);
        Ok(())
    }

    async fn get_document(&self, id: DocumentId) -> Result<Option<StoredDocument>> {
        let inner = self.read()?;
        Ok(inner.documents.get(&id).cloned())
    }

    async fn update_document(&self, document: &StoredDocument) -> Result<()> {
        let mut inner = self.write()?;
        match inner.documents.get_mut(&document.id()) {
            Some(slot) => {
                *slot = document.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(document.id())),
        }
    }

    async fn list_documents(&self, owner: Option<&Principal>) -> Result<Vec<DocumentId>> {
        let inner = self.read()?;

        let mut ids: Vec<DocumentId> = inner
            .documents
            .values()
            .filter(|d| owner.map_or(true, |o| &d.record.owner == o))
            .map(|d| d.id())
            .collect();

        ids.sort();
        Ok(ids)
    }

    async fn insert_version(&self, id: DocumentId, version: &Version) -> Result<InsertResult> {
        let mut inner = self.write()?;

        let history = inner.versions.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let count = history.len() as u64;

        if version.index < count {
            let existing = &history[version.index as usize];
            if existing == version {
                return Ok(InsertResult::AlreadyExists);
            }
            return Ok(InsertResult::Conflict {
                existing: existing.digest,
            });
        }

        if version.index > count {
            return Err(StoreError::NonContiguousVersion {
                document_id: id,
                expected: count,
                got: version.index,
            });
        }

        history.push(version.clone());
        Ok(InsertResult::Inserted)
    }

    async fn get_version(&self, id: DocumentId, index: u64) -> Result<Option<Version>> {
        let inner = self.read()?;
        Ok(inner
            .versions
            .get(&id)
            .and_then(|h| usize::try_from(index).ok().and_then(|i| h.get(i)))
            .cloned())
    }

    async fn latest_version(&self, id: DocumentId) -> Result<Option<Version>> {
        let inner = self.read()?;
        Ok(inner.versions.get(&id).and_then(|h| h.last()).cloned())
    }

    async fn version_count(&self, id: DocumentId) -> Result<u64> {
        let inner = self.read()?;
        Ok(inner.versions.get(&id).map_or(0, |h| h.len() as u64))
    }

    async fn get_versions_range(
        &self,
        id: DocumentId,
        start: u64,
        end: u64,
    ) -> Result<Vec<Version>> {
        let inner = self.read()?;

        let Some(history) = inner.versions.get(&id) else {
            return Ok(Vec::new());
        };

        Ok(history
            .iter()
            .filter(|v| v.index >= start && v.index <= end)
            .cloned()
            .collect())
    }
}
