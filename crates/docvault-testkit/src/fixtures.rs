//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use docvault::{
    AuditEvent, CertificationMode, DocumentId, Ledger, LedgerConfig, LedgerError, ManualClock,
    MemorySink, Principal, Result, Role, Version,
};
use docvault_store::{MemoryStore, Store, StoreExt, StoredDocument};

use crate::generators::{Actor, Op};

/// Start time of every fixture clock (2023-11-14T22:13:20Z).
pub const FIXTURE_EPOCH: i64 = 1_700_000_000_000;

/// A ledger over a memory store with a manual clock, a recording sink and a
/// cast of named principals.
pub struct LedgerFixture {
    pub ledger: Arc<Ledger<MemoryStore>>,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<MemorySink>,
    pub owner: Principal,
    pub editor: Principal,
    pub validator: Principal,
    pub reader: Principal,
    /// Holds no role on any fixture document.
    pub stranger: Principal,
}

/// Everything stored about one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSnapshot {
    pub head: StoredDocument,
    pub history: Vec<Version>,
}

impl LedgerFixture {
    /// Multi-validator fixture.
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_mode(mode: CertificationMode) -> Self {
        Self::with_config(LedgerConfig::with_mode(mode))
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH));
        let sink = Arc::new(MemorySink::new());
        let ledger = Ledger::with_clock(MemoryStore::new(), config, clock.clone())
            .with_sink(sink.clone());

        Self {
            ledger: Arc::new(ledger),
            clock,
            sink,
            owner: Principal::from("owner"),
            editor: Principal::from("editor"),
            validator: Principal::from("validator"),
            reader: Principal::from("reader"),
            stranger: Principal::from("stranger"),
        }
    }

    /// Resolve an actor to its principal.
    pub fn principal(&self, actor: Actor) -> Principal {
        match actor {
            Actor::Owner => self.owner.clone(),
            Actor::Editor => self.editor.clone(),
            Actor::Validator => self.validator.clone(),
            Actor::Reader => self.reader.clone(),
            Actor::Stranger => self.stranger.clone(),
            Actor::Null => Principal::null(),
        }
    }

    /// Create a document owned by `owner` with one version.
    pub async fn create_document(&self) -> Result<DocumentId> {
        self.ledger.create(&self.owner, "QmInitial", "initial").await
    }

    /// Create a document and grant each fixture role to its principal.
    pub async fn create_staffed_document(&self) -> Result<DocumentId> {
        let id = self.create_document().await?;
        for (principal, role) in [
            (&self.editor, Role::Editor),
            (&self.validator, Role::Validator),
            (&self.reader, Role::Reader),
        ] {
            self.ledger.grant(id, &self.owner, principal, role).await?;
        }
        Ok(id)
    }

    /// Capture the stored state of a document.
    pub async fn snapshot(&self, id: DocumentId) -> Result<DocumentSnapshot> {
        let store = self.ledger.store();
        let head = store
            .get_document(id)
            .await?
            .ok_or(LedgerError::NotFound(id))?;
        Ok(DocumentSnapshot {
            head,
            history: store.history(id).await?,
        })
    }

    /// Events recorded so far.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.sink.events()
    }

    /// Run one generated operation against `id`, advancing the clock first.
    pub async fn apply(&self, id: DocumentId, op: &Op) -> Result<()> {
        self.clock.advance(1);
        let ledger = &self.ledger;

        match op {
            Op::Update { actor, content_id, note } => ledger
                .update(id, &self.principal(*actor), content_id.as_str(), note.as_str())
                .await
                .map(|_| ()),
            Op::Sign { actor } => ledger.sign(id, &self.principal(*actor)).await,
            Op::Revoke { actor } => ledger.revoke(id, &self.principal(*actor)).await,
            Op::Suspend { actor } => ledger.suspend(id, &self.principal(*actor)).await,
            Op::Transfer { actor, to } => {
                ledger
                    .transfer_ownership(id, &self.principal(*actor), &self.principal(*to))
                    .await
            }
            Op::Grant { actor, to, role } => ledger
                .grant(id, &self.principal(*actor), &self.principal(*to), *role)
                .await
                .map(|_| ()),
            Op::RevokeRole { actor, from, role } => ledger
                .revoke_role(id, &self.principal(*actor), &self.principal(*from), *role)
                .await
                .map(|_| ()),
        }
    }
}

impl Default for LedgerFixture {
    fn default() -> Self {
        Self::new()
    }
}
