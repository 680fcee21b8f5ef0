//! The Ledger: document lifecycle and authorization engine.
//!
//! Every public operation follows the same shape:
//!
//! 1. lock the document,
//! 2. load its head state (`NotFound` if unknown),
//! 3. pass the authorization gate,
//! 4. check lifecycle state, then arguments,
//! 5. write the change to the store in one call,
//! 6. emit one audit event.
//!
//! Any failure before step 5 leaves the store untouched, and nothing is
//! emitted unless step 5 succeeded.

use std::sync::Arc;

use docvault_core::{
    validate_history, CertificationMode, Clock, ContentId, DocumentId, DocumentRecord,
    DocumentStatus, Principal, SystemClock, ValidationError, Version, VersionDraft,
};
use docvault_perms::{authorize, Capability, Decision, Denial, Role};
use docvault_store::{InsertResult, Store, StoreExt, StoredDocument};
use tokio::sync::{broadcast, Mutex};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::events::{AuditEvent, AuditRecord, Emitter, EventSink};
use crate::locks::{DocumentGuard, DocumentLocks};
use crate::query::{DocumentSummary, SignatureStatus, ValidatorSignature};

/// The main Ledger struct.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct Ledger<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    /// Configuration.
    config: LedgerConfig,
    /// Source of version and signature timestamps.
    clock: Arc<dyn Clock>,
    /// One async mutex per document.
    locks: DocumentLocks,
    /// Serializes id allocation with insertion.
    create_lock: Mutex<()>,
    /// Audit event fan-out.
    events: Emitter,
}

impl<S: Store> Ledger<S> {
    /// Create a ledger using the system clock.
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock::new()))
    }

    /// Create a ledger with an explicit clock.
    pub fn with_clock(store: S, config: LedgerConfig, clock: Arc<dyn Clock>) -> Self {
        let events = Emitter::new(config.event_channel_capacity);
        Self {
            store: Arc::new(store),
            config,
            clock,
            locks: DocumentLocks::new(),
            create_lock: Mutex::new(()),
            events,
        }
    }

    /// Register an additional event sink.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events.add_sink(sink);
        self
    }

    /// Receive every record emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AuditRecord> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn certification_mode(&self) -> CertificationMode {
        self.config.certification
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a document owned by `caller`, with its initial version.
    ///
    /// The document starts in `Draft`. Ids are handed out sequentially from 1.
    pub async fn create(
        &self,
        caller: &Principal,
        content_id: impl Into<ContentId>,
        note: impl Into<String>,
    ) -> Result<DocumentId> {
        let content_id = content_id.into();
        require_principal(caller, "owner")?;
        require_content(&content_id)?;

        let _creating = self.create_lock.lock().await;

        let id = self.store.allocate_document_id().await?;
        let now = self.clock.now_millis();

        let initial =
            VersionDraft::new(content_id.clone(), caller.clone(), note).seal_initial(id, now)?;
        let document = StoredDocument::new(DocumentRecord::new(id, caller.clone(), now));

        self.store.insert_document(&document, &initial).await?;

        tracing::debug!(document_id = %id, owner = %caller, "document created");
        self.events.emit(
            now,
            AuditEvent::DocumentCreated {
                id,
                owner: caller.clone(),
                content_id,
            },
        );
        Ok(id)
    }

    /// Append a version. Requires `can_edit`; refused once revoked.
    ///
    /// Returns the index of the new version. Status is unchanged.
    pub async fn update(
        &self,
        id: DocumentId,
        caller: &Principal,
        content_id: impl Into<ContentId>,
        note: impl Into<String>,
    ) -> Result<u64> {
        let content_id = content_id.into();
        let (_guard, doc) = self.open(id, caller, Capability::CanEdit).await?;
        ensure_not_revoked(&doc)?;
        require_content(&content_id)?;

        let latest = self.store.latest_version(id).await?.ok_or(
            LedgerError::HistoryCorrupted {
                id,
                source: ValidationError::EmptyHistory(id),
            },
        )?;

        if self.config.verify_chain_on_append && !latest.verify_digest(id)? {
            tracing::warn!(document_id = %id, index = latest.index, "refusing to extend corrupted history");
            return Err(LedgerError::HistoryCorrupted {
                id,
                source: ValidationError::DigestMismatch {
                    index: latest.index,
                },
            });
        }

        // Never earlier than the version it follows.
        let now = self.clock.now_millis().max(latest.timestamp);
        let version =
            VersionDraft::new(content_id.clone(), caller.clone(), note).seal_after(id, &latest, now)?;

        match self.store.insert_version(id, &version).await? {
            InsertResult::Inserted => {}
            InsertResult::AlreadyExists | InsertResult::Conflict { .. } => {
                return Err(LedgerError::VersionConflict {
                    id,
                    index: version.index,
                });
            }
        }

        tracing::debug!(document_id = %id, index = version.index, author = %caller, "version appended");
        self.events.emit(
            now,
            AuditEvent::DocumentUpdated {
                id,
                index: version.index,
                author: caller.clone(),
                content_id,
                note: version.note.clone(),
            },
        );
        Ok(version.index)
    }

    /// Certify the document as `caller`. Requires `is_validator`.
    ///
    /// The first accepted signature makes the document `Active` (also from
    /// `Suspended`). Whether further signatures are accepted depends on the
    /// configured [`CertificationMode`].
    pub async fn sign(&self, id: DocumentId, caller: &Principal) -> Result<()> {
        let (_guard, mut doc) = self.open(id, caller, Capability::IsValidator).await?;
        ensure_not_revoked(&doc)?;

        let now = self.clock.now_millis();
        doc.record
            .certification
            .sign(self.config.certification, caller.clone(), now)
            .map_err(|refusal| {
                tracing::debug!(document_id = %id, validator = %caller, ?refusal, "signature refused");
                LedgerError::AlreadySigned(id)
            })?;
        doc.record.status = DocumentStatus::Active;
        doc.record.touch(now);

        self.store.update_document(&doc).await?;

        tracing::debug!(
            document_id = %id,
            validator = %caller,
            signatures = doc.record.certification.count(),
            "document signed"
        );
        self.events.emit(
            now,
            AuditEvent::DocumentSigned {
                id,
                validator: caller.clone(),
            },
        );
        Ok(())
    }

    /// Revoke the document for good. Owner only.
    ///
    /// Revoking a revoked document succeeds without change or event.
    pub async fn revoke(&self, id: DocumentId, caller: &Principal) -> Result<()> {
        let (_guard, mut doc) = self.open(id, caller, Capability::IsOwner).await?;

        if doc.record.is_revoked() {
            return Ok(());
        }

        let now = self.clock.now_millis();
        doc.record.status = DocumentStatus::Revoked;
        doc.record.touch(now);
        self.store.update_document(&doc).await?;

        tracing::debug!(document_id = %id, "document revoked");
        self.events.emit(now, AuditEvent::DocumentRevoked { id });
        Ok(())
    }

    /// Put a `Draft` or `Active` document on hold. Owner only.
    ///
    /// A validator signature reactivates it. Suspending a suspended document
    /// is a no-op; a revoked one fails with `DocumentRevoked`. In
    /// single-certifier mode a certified document can no longer be signed, so
    /// suspending it fails with `CertificationFinal`.
    pub async fn suspend(&self, id: DocumentId, caller: &Principal) -> Result<()> {
        let (_guard, mut doc) = self.open(id, caller, Capability::IsOwner).await?;
        ensure_not_revoked(&doc)?;

        if !doc.record.status.can_suspend() {
            return Ok(());
        }
        if doc.record.certification.is_final(self.config.certification) {
            tracing::debug!(document_id = %id, "refusing to suspend a certified document");
            return Err(LedgerError::CertificationFinal(id));
        }

        let now = self.clock.now_millis();
        doc.record.status = DocumentStatus::Suspended;
        doc.record.touch(now);
        self.store.update_document(&doc).await?;

        tracing::debug!(document_id = %id, "document suspended");
        self.events.emit(now, AuditEvent::DocumentSuspended { id });
        Ok(())
    }

    /// Hand the document to `new_owner`. Owner only; status is unchanged.
    ///
    /// The previous owner keeps only the roles explicitly granted to them.
    pub async fn transfer_ownership(
        &self,
        id: DocumentId,
        caller: &Principal,
        new_owner: &Principal,
    ) -> Result<()> {
        let (_guard, mut doc) = self.open(id, caller, Capability::IsOwner).await?;
        require_principal(new_owner, "new owner")?;

        if &doc.record.owner == new_owner {
            return Ok(());
        }

        let now = self.clock.now_millis();
        let old_owner = std::mem::replace(&mut doc.record.owner, new_owner.clone());
        doc.record.touch(now);
        self.store.update_document(&doc).await?;

        tracing::debug!(document_id = %id, from = %old_owner, to = %new_owner, "ownership transferred");
        self.events.emit(
            now,
            AuditEvent::OwnershipTransferred {
                id,
                old_owner,
                new_owner: new_owner.clone(),
            },
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permission Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant `role` to `principal`. Owner only.
    ///
    /// Returns `false` (and emits nothing) if the role was already held.
    pub async fn grant(
        &self,
        id: DocumentId,
        caller: &Principal,
        principal: &Principal,
        role: Role,
    ) -> Result<bool> {
        let (_guard, mut doc) = self.open(id, caller, Capability::IsOwner).await?;

        let now = self.clock.now_millis();
        if !doc.permissions.grant(principal.clone(), role, now)? {
            return Ok(false);
        }
        doc.record.touch(now);
        self.store.update_document(&doc).await?;

        tracing::debug!(document_id = %id, %principal, %role, "role granted");
        self.events.emit(
            now,
            AuditEvent::PermissionGranted {
                id,
                principal: principal.clone(),
                role,
            },
        );
        Ok(true)
    }

    /// Revoke `role` from `principal`. Owner only.
    ///
    /// Returns `false` (and emits nothing) if the role was not held. Signatures
    /// already given by a revoked validator stay on record.
    pub async fn revoke_role(
        &self,
        id: DocumentId,
        caller: &Principal,
        principal: &Principal,
        role: Role,
    ) -> Result<bool> {
        let (_guard, mut doc) = self.open(id, caller, Capability::IsOwner).await?;
        require_principal(principal, "principal")?;

        if !doc.permissions.revoke(principal, role) {
            return Ok(false);
        }
        let now = self.clock.now_millis();
        doc.record.touch(now);
        self.store.update_document(&doc).await?;

        tracing::debug!(document_id = %id, %principal, %role, "role revoked");
        self.events.emit(
            now,
            AuditEvent::PermissionRevoked {
                id,
                principal: principal.clone(),
                role,
            },
        );
        Ok(true)
    }

    /// Members of `role`, in grant order. Owner only.
    pub async fn list_role(
        &self,
        id: DocumentId,
        caller: &Principal,
        role: Role,
    ) -> Result<Vec<Principal>> {
        let (_guard, doc) = self.open(id, caller, Capability::IsOwner).await?;
        Ok(doc.permissions.list(role))
    }

    pub async fn list_editors(&self, id: DocumentId, caller: &Principal) -> Result<Vec<Principal>> {
        self.list_role(id, caller, Role::Editor).await
    }

    pub async fn list_validators(
        &self,
        id: DocumentId,
        caller: &Principal,
    ) -> Result<Vec<Principal>> {
        self.list_role(id, caller, Role::Validator).await
    }

    pub async fn list_readers(&self, id: DocumentId, caller: &Principal) -> Result<Vec<Principal>> {
        self.list_role(id, caller, Role::Reader).await
    }

    /// Roles explicitly held by `principal`. Owner only.
    pub async fn roles_of(
        &self,
        id: DocumentId,
        caller: &Principal,
        principal: &Principal,
    ) -> Result<Vec<Role>> {
        let (_guard, doc) = self.open(id, caller, Capability::IsOwner).await?;
        Ok(doc.permissions.roles_of(principal))
    }

    /// Evaluate `capability` for `principal`.
    ///
    /// Unknown documents are denied rather than reported as errors.
    pub async fn authorize(
        &self,
        id: DocumentId,
        principal: &Principal,
        capability: Capability,
    ) -> Result<Decision> {
        let _guard = self.locks.acquire(id).await;
        Ok(match self.store.get_document(id).await? {
            Some(doc) => authorize(&doc.record.owner, &doc.permissions, principal, capability),
            None => Decision::Denied(Denial::UnknownDocument),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Id, owner, status and latest note. Requires `can_read`.
    pub async fn summary(&self, id: DocumentId, caller: &Principal) -> Result<DocumentSummary> {
        let (_guard, doc) = self.open(id, caller, Capability::CanRead).await?;
        let latest = self.latest_of(id).await?;
        let version_count = self.store.version_count(id).await?;

        Ok(DocumentSummary {
            id,
            owner: doc.record.owner,
            status: doc.record.status,
            latest_note: latest.note,
            version_count,
            created_at: doc.record.created_at,
            updated_at: doc.record.updated_at,
        })
    }

    /// The latest version. Requires `can_read`.
    pub async fn latest_version(&self, id: DocumentId, caller: &Principal) -> Result<Version> {
        let (_guard, _doc) = self.open(id, caller, Capability::CanRead).await?;
        self.latest_of(id).await
    }

    /// Number of versions. Requires `can_read`.
    pub async fn version_count(&self, id: DocumentId, caller: &Principal) -> Result<u64> {
        let (_guard, _doc) = self.open(id, caller, Capability::CanRead).await?;
        Ok(self.store.version_count(id).await?)
    }

    /// The version at `index`. Requires `can_read`.
    pub async fn version(&self, id: DocumentId, caller: &Principal, index: u64) -> Result<Version> {
        let (_guard, _doc) = self.open(id, caller, Capability::CanRead).await?;
        self.store
            .get_version(id, index)
            .await?
            .ok_or(LedgerError::VersionNotFound { id, index })
    }

    /// Every version in append order. Requires `can_read`.
    pub async fn history(&self, id: DocumentId, caller: &Principal) -> Result<Vec<Version>> {
        let (_guard, _doc) = self.open(id, caller, Capability::CanRead).await?;
        Ok(self.store.history(id).await?)
    }

    /// Recompute the digest chain. Requires `can_read`.
    ///
    /// Returns the number of verified versions.
    pub async fn verify_history(&self, id: DocumentId, caller: &Principal) -> Result<u64> {
        let (_guard, _doc) = self.open(id, caller, Capability::CanRead).await?;
        let history = self.store.history(id).await?;

        validate_history(id, &history).map_err(|source| {
            tracing::warn!(document_id = %id, error = %source, "history verification failed");
            LedgerError::HistoryCorrupted { id, source }
        })?;

        Ok(history.len() as u64)
    }

    /// Certification state with per-validator detail. Owner only.
    pub async fn signature_status(
        &self,
        id: DocumentId,
        caller: &Principal,
    ) -> Result<SignatureStatus> {
        let (_guard, doc) = self.open(id, caller, Capability::IsOwner).await?;
        let certification = &doc.record.certification;

        let validators = doc
            .permissions
            .list(Role::Validator)
            .into_iter()
            .map(|validator| ValidatorSignature {
                signed_at: certification.signature_of(&validator).map(|s| s.signed_at),
                validator,
            })
            .collect();

        Ok(SignatureStatus {
            mode: self.config.certification,
            status: doc.record.status,
            validators,
            signatures: certification.signatures().to_vec(),
        })
    }

    /// Ids of the documents `owner` owns, ascending. Callers may only list their own.
    pub async fn documents_owned_by(
        &self,
        caller: &Principal,
        owner: &Principal,
    ) -> Result<Vec<DocumentId>> {
        require_principal(owner, "owner")?;
        if caller != owner {
            tracing::debug!(caller = %caller, owner = %owner, "denied listing of foreign documents");
            return Err(LedgerError::Unauthorized(Denial::NotOwner));
        }
        Ok(self.store.list_documents(Some(owner)).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Lock the document, load it and check `capability` for `caller`.
    async fn open(
        &self,
        id: DocumentId,
        caller: &Principal,
        capability: Capability,
    ) -> Result<(DocumentGuard<'_>, StoredDocument)> {
        let guard = self.locks.acquire(id).await;
        let doc = self
            .store
            .get_document(id)
            .await?
            .ok_or(LedgerError::NotFound(id))?;

        if let Decision::Denied(denial) =
            authorize(&doc.record.owner, &doc.permissions, caller, capability)
        {
            tracing::debug!(document_id = %id, caller = %caller, %capability, %denial, "denied");
            return Err(LedgerError::Unauthorized(denial));
        }

        Ok((guard, doc))
    }

    async fn latest_of(&self, id: DocumentId) -> Result<Version> {
        self.store
            .latest_version(id)
            .await?
            .ok_or(LedgerError::NotFound(id))
    }
}

fn ensure_not_revoked(doc: &StoredDocument) -> Result<()> {
    if doc.record.is_revoked() {
        return Err(LedgerError::DocumentRevoked(doc.id()));
    }
    Ok(())
}

fn require_principal(principal: &Principal, what: &str) -> Result<()> {
    if principal.is_null() {
        return Err(LedgerError::InvalidArgument(format!(
            "{what} must not be the null principal"
        )));
    }
    Ok(())
}

fn require_content(content_id: &ContentId) -> Result<()> {
    if content_id.is_empty() {
        return Err(LedgerError::InvalidArgument(
            "content id must not be empty".into(),
        ));
    }
    Ok(())
}
