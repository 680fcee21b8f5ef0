//! Audit events.
//!
//! Every successful mutation publishes exactly one [`AuditRecord`] to every
//! registered [`EventSink`], after the change is durable. Failed or denied
//! operations publish nothing. Records carry a process-wide sequence number so
//! consumers can order them even across documents.
//!
//! Sinks are synchronous and must not block: the ledger calls them while it
//! still holds the document lock. Numbering and delivery happen under one
//! mutex, so every sink sees records in `seq` order.

use std::sync::{Arc, Mutex};

use docvault_core::{ContentId, DocumentId, Principal};
use docvault_perms::Role;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// A state change of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    DocumentCreated {
        id: DocumentId,
        owner: Principal,
        content_id: ContentId,
    },
    DocumentUpdated {
        id: DocumentId,
        index: u64,
        author: Principal,
        content_id: ContentId,
        note: String,
    },
    DocumentSigned {
        id: DocumentId,
        validator: Principal,
    },
    DocumentSuspended {
        id: DocumentId,
    },
    DocumentRevoked {
        id: DocumentId,
    },
    OwnershipTransferred {
        id: DocumentId,
        old_owner: Principal,
        new_owner: Principal,
    },
    PermissionGranted {
        id: DocumentId,
        principal: Principal,
        role: Role,
    },
    PermissionRevoked {
        id: DocumentId,
        principal: Principal,
        role: Role,
    },
}

impl AuditEvent {
    /// The document the event is about.
    pub fn document_id(&self) -> DocumentId {
        match self {
            Self::DocumentCreated { id, .. }
            | Self::DocumentUpdated { id, .. }
            | Self::DocumentSigned { id, .. }
            | Self::DocumentSuspended { id }
            | Self::DocumentRevoked { id }
            | Self::OwnershipTransferred { id, .. }
            | Self::PermissionGranted { id, .. }
            | Self::PermissionRevoked { id, .. } => *id,
        }
    }

    /// Stable name of the event kind (matches the JSON `type` tag).
    pub fn name(&self) -> &'static str {
        match self {
            Self::DocumentCreated { .. } => "document_created",
            Self::DocumentUpdated { .. } => "document_updated",
            Self::DocumentSigned { .. } => "document_signed",
            Self::DocumentSuspended { .. } => "document_suspended",
            Self::DocumentRevoked { .. } => "document_revoked",
            Self::OwnershipTransferred { .. } => "ownership_transferred",
            Self::PermissionGranted { .. } => "permission_granted",
            Self::PermissionRevoked { .. } => "permission_revoked",
        }
    }
}

/// An event as published: sequence number, time and payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Strictly increasing within a ledger, starting at 1.
    pub seq: u64,
    /// Clock time of the mutation (Unix ms).
    pub at: i64,
    pub event: AuditEvent,
}

impl AuditRecord {
    /// Serialize as one JSON object.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Consumer of audit records.
pub trait EventSink: Send + Sync {
    fn emit(&self, record: &AuditRecord);
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records received so far, in emission order.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.lock().clone()
    }

    /// Just the events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.lock().iter().map(|r| r.event.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // A panicking reader cannot leave the Vec half-written.
    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AuditRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EventSink for MemorySink {
    fn emit(&self, record: &AuditRecord) {
        self.lock().push(record.clone());
    }
}

/// Writes one structured log line per record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, record: &AuditRecord) {
        tracing::info!(
            seq = record.seq,
            at = record.at,
            document_id = %record.event.document_id(),
            event = record.event.name(),
            "audit"
        );
    }
}

/// Fans records out to live subscribers over a tokio broadcast channel.
///
/// Slow subscribers lag and lose the oldest records; the ledger never waits.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    sender: broadcast::Sender<AuditRecord>,
}

impl BroadcastSink {
    /// Create a channel buffering up to `capacity` records (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuditRecord> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, record: &AuditRecord) {
        // No subscribers is not an error.
        let _ = self.sender.send(record.clone());
    }
}

/// Numbers events and hands them to every sink.
pub(crate) struct Emitter {
    /// Last assigned sequence number; held while sinks run.
    seq: Mutex<u64>,
    broadcast: BroadcastSink,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl Emitter {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            seq: Mutex::new(0),
            broadcast: BroadcastSink::new(capacity),
            sinks: Vec::new(),
        }
    }

    pub(crate) fn add_sink(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<AuditRecord> {
        self.broadcast.subscribe()
    }

    pub(crate) fn emit(&self, at: i64, event: AuditEvent) -> AuditRecord {
        // A sink that panicked leaves the counter itself intact.
        let mut seq = self.seq.lock().unwrap_or_else(|e| e.into_inner());
        *seq += 1;
        let record = AuditRecord {
            seq: *seq,
            at,
            event,
        };
        for sink in &self.sinks {
            sink.emit(&record);
        }
        self.broadcast.emit(&record);
        record
    }
}
