//! Per-document mutual exclusion.
//!
//! Operations on the same document are linearized by holding that document's
//! async mutex for the whole read-validate-mutate-emit sequence. Different
//! documents never share a lock, so there is no lock ordering to respect.
//!
//! The table only holds entries for documents with an operation in flight.
//! The last guard out removes its entry, so lookups of ids that were never
//! created leave nothing behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use docvault_core::DocumentId;
use tokio::sync::OwnedMutexGuard;

type LockTable = HashMap<DocumentId, Arc<tokio::sync::Mutex<()>>>;

#[derive(Default)]
pub(crate) struct DocumentLocks {
    table: Mutex<LockTable>,
}

impl DocumentLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, LockTable> {
        // The table holds only Arcs; a poisoned guard is still consistent.
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait for exclusive access to `id`.
    pub(crate) async fn acquire(&self, id: DocumentId) -> DocumentGuard<'_> {
        let lock = Arc::clone(self.table().entry(id).or_default());
        // If this future is dropped while waiting, the clone is released and a
        // later guard drop sweeps the entry.
        let held = lock.lock_owned().await;
        DocumentGuard {
            locks: self,
            id,
            held: Some(held),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.table().len()
    }
}

/// Held for the duration of one operation on one document.
pub(crate) struct DocumentGuard<'a> {
    locks: &'a DocumentLocks,
    id: DocumentId,
    held: Option<OwnedMutexGuard<()>>,
}

impl Drop for DocumentGuard<'_> {
    fn drop(&mut self) {
        // Release the mutex first so its Arc no longer counts.
        self.held.take();

        let mut table = self.locks.table();
        // Waiters clone the Arc under the table lock, so a count of one means
        // nobody else holds or waits for this document.
        if table
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_document_is_exclusive() {
        let locks = Arc::new(DocumentLocks::new());
        let guard = locks.acquire(DocumentId::FIRST).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _g = locks.acquire(DocumentId::FIRST).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        assert_eq!(locks.len(), 1);

        // The entry survives the first release while the contender waits.
        drop(guard);
        contender.await.unwrap();
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_different_documents_do_not_contend() {
        let locks = DocumentLocks::new();
        let a = locks.acquire(DocumentId::FIRST).await;
        let b = locks.acquire(DocumentId::FIRST.next()).await;
        assert_eq!(locks.len(), 2);

        drop(a);
        assert_eq!(locks.len(), 1);
        drop(b);
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_abandoned_wait_is_swept() {
        let locks = DocumentLocks::new();
        let guard = locks.acquire(DocumentId::FIRST).await;

        // Start waiting, then give up before the lock is free.
        let waiting = tokio::time::timeout(
            Duration::from_millis(10),
            locks.acquire(DocumentId::FIRST),
        )
        .await;
        assert!(waiting.is_err());

        drop(guard);
        assert_eq!(locks.len(), 0);
    }
}
