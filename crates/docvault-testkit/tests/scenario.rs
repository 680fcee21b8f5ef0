//! End-to-end lifecycle scenarios.

use docvault::{
    AuditEvent, CertificationMode, ContentId, Denial, DocumentId, DocumentStatus, ErrorKind,
    LedgerError, Principal, Role,
};
use docvault_testkit::LedgerFixture;

#[tokio::test]
async fn test_reference_scenario() {
    let fx = LedgerFixture::new();
    let editor_a = Principal::from("editorA");
    let val_b = Principal::from("valB");

    // create(doc, cid="Qm1", note="v1") -> id=1, Draft, one version
    let id = fx.ledger.create(&fx.owner, "Qm1", "v1").await.unwrap();
    assert_eq!(id, DocumentId::FIRST);
    let summary = fx.ledger.summary(id, &fx.owner).await.unwrap();
    assert_eq!(summary.status, DocumentStatus::Draft);
    assert_eq!(summary.version_count, 1);

    fx.ledger.grant(id, &fx.owner, &editor_a, Role::Editor).await.unwrap();
    fx.ledger.update(id, &editor_a, "Qm2", "fix").await.unwrap();

    let history = fx.ledger.history(id, &fx.owner).await.unwrap();
    let cids: Vec<&str> = history.iter().map(|v| v.content_id.as_str()).collect();
    assert_eq!(cids, vec!["Qm1", "Qm2"]);
    assert_eq!(history[1].author, editor_a);
    let summary = fx.ledger.summary(id, &fx.owner).await.unwrap();
    assert_eq!(summary.status, DocumentStatus::Draft);

    fx.ledger.grant(id, &fx.owner, &val_b, Role::Validator).await.unwrap();
    fx.ledger.sign(id, &val_b).await.unwrap();
    let summary = fx.ledger.summary(id, &fx.owner).await.unwrap();
    assert_eq!(summary.status, DocumentStatus::Active);

    fx.ledger.revoke(id, &fx.owner).await.unwrap();
    let summary = fx.ledger.summary(id, &fx.owner).await.unwrap();
    assert_eq!(summary.status, DocumentStatus::Revoked);

    let err = fx.ledger.update(id, &editor_a, "Qm3", "late").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    // Revoked documents stay readable.
    assert_eq!(fx.ledger.history(id, &fx.owner).await.unwrap().len(), 2);
    assert_eq!(fx.ledger.verify_history(id, &fx.owner).await.unwrap(), 2);

    assert_eq!(
        fx.events(),
        vec![
            AuditEvent::DocumentCreated {
                id,
                owner: fx.owner.clone(),
                content_id: ContentId::from("Qm1"),
            },
            AuditEvent::PermissionGranted {
                id,
                principal: editor_a.clone(),
                role: Role::Editor,
            },
            AuditEvent::DocumentUpdated {
                id,
                index: 1,
                author: editor_a.clone(),
                content_id: ContentId::from("Qm2"),
                note: "fix".into(),
            },
            AuditEvent::PermissionGranted {
                id,
                principal: val_b.clone(),
                role: Role::Validator,
            },
            AuditEvent::DocumentSigned {
                id,
                validator: val_b.clone(),
            },
            AuditEvent::DocumentRevoked { id },
        ]
    );
}

#[tokio::test]
async fn test_ids_are_sequential() {
    let fx = LedgerFixture::new();
    for expected in 1..=5u64 {
        let id = fx.create_document().await.unwrap();
        assert_eq!(id.get(), expected);
    }
    let owned = fx.ledger.documents_owned_by(&fx.owner, &fx.owner).await.unwrap();
    assert_eq!(owned.len(), 5);
}

#[tokio::test]
async fn test_query_surface_is_gated() {
    let fx = LedgerFixture::new();
    let id = fx.create_staffed_document().await.unwrap();

    // Readers read, but cannot see administration.
    assert!(fx.ledger.summary(id, &fx.reader).await.is_ok());
    assert!(fx.ledger.latest_version(id, &fx.reader).await.is_ok());
    assert_eq!(fx.ledger.version_count(id, &fx.reader).await.unwrap(), 1);
    for result in [
        fx.ledger.list_validators(id, &fx.reader).await,
        fx.ledger.list_readers(id, &fx.reader).await,
        fx.ledger.list_editors(id, &fx.reader).await,
    ] {
        assert_eq!(result.unwrap_err().denial(), Some(Denial::NotOwner));
    }
    let err = fx.ledger.signature_status(id, &fx.reader).await.unwrap_err();
    assert_eq!(err.denial(), Some(Denial::NotOwner));

    // Editors and validators hold no read capability of their own.
    for caller in [&fx.editor, &fx.validator, &fx.stranger] {
        let err = fx.ledger.summary(id, caller).await.unwrap_err();
        assert_eq!(err.denial(), Some(Denial::NotReader));
    }

    // The owner sees everything.
    assert_eq!(fx.ledger.list_validators(id, &fx.owner).await.unwrap(), vec![fx.validator.clone()]);
    assert_eq!(fx.ledger.list_readers(id, &fx.owner).await.unwrap(), vec![fx.reader.clone()]);
    assert_eq!(
        fx.ledger.roles_of(id, &fx.owner, &fx.editor).await.unwrap(),
        vec![Role::Editor]
    );
}

#[tokio::test]
async fn test_roles_are_independent_of_ownership() {
    let fx = LedgerFixture::new();
    let id = fx.create_staffed_document().await.unwrap();

    // A principal may hold several roles at once.
    fx.ledger.grant(id, &fx.owner, &fx.editor, Role::Reader).await.unwrap();
    assert!(fx.ledger.summary(id, &fx.editor).await.is_ok());

    // The new owner inherits nothing explicit; the old owner keeps only grants.
    fx.ledger.transfer_ownership(id, &fx.owner, &fx.reader).await.unwrap();
    let err = fx.ledger.update(id, &fx.owner, "Qm2", "").await.unwrap_err();
    assert_eq!(err.denial(), Some(Denial::NotEditor));
    fx.ledger.update(id, &fx.reader, "Qm2", "by new owner").await.unwrap();

    assert_eq!(
        fx.events().last(),
        Some(&AuditEvent::DocumentUpdated {
            id,
            index: 1,
            author: fx.reader.clone(),
            content_id: ContentId::from("Qm2"),
            note: "by new owner".into(),
        })
    );
}

#[tokio::test]
async fn test_single_certifier_blocks_everyone_after_first() {
    let fx = LedgerFixture::with_mode(CertificationMode::SingleCertifier);
    let id = fx.create_staffed_document().await.unwrap();
    let second = Principal::from("second-validator");
    fx.ledger.grant(id, &fx.owner, &second, Role::Validator).await.unwrap();

    fx.ledger.sign(id, &second).await.unwrap();
    for caller in [&second, &fx.validator] {
        let err = fx.ledger.sign(id, caller).await.unwrap_err();
        assert!(matches!(err, LedgerError::AlreadySigned(_)));
    }

    let status = fx.ledger.signature_status(id, &fx.owner).await.unwrap();
    assert_eq!(status.status, DocumentStatus::Active);
    assert_eq!(status.signed_count(), 1);
    assert_eq!(status.signatures[0].validator, second);
}

#[tokio::test]
async fn test_multi_validator_accumulates() {
    let fx = LedgerFixture::new();
    let id = fx.create_staffed_document().await.unwrap();
    let other = Principal::from("other-validator");
    fx.ledger.grant(id, &fx.owner, &other, Role::Validator).await.unwrap();

    fx.ledger.sign(id, &fx.validator).await.unwrap();
    let err = fx.ledger.sign(id, &fx.validator).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadySigned);
    fx.ledger.sign(id, &other).await.unwrap();

    let status = fx.ledger.signature_status(id, &fx.owner).await.unwrap();
    assert_eq!(status.signed_count(), 2);
    assert_eq!(status.pending().count(), 0);
    assert_eq!(status.status, DocumentStatus::Active);
}

#[tokio::test]
async fn test_revoked_validator_signature_stays() {
    let fx = LedgerFixture::new();
    let id = fx.create_staffed_document().await.unwrap();
    fx.ledger.sign(id, &fx.validator).await.unwrap();
    fx.ledger
        .revoke_role(id, &fx.owner, &fx.validator, Role::Validator)
        .await
        .unwrap();

    let status = fx.ledger.signature_status(id, &fx.owner).await.unwrap();
    assert!(status.validators.is_empty());
    assert_eq!(status.signed_count(), 1);
    assert_eq!(status.status, DocumentStatus::Active);

    let err = fx.ledger.sign(id, &fx.validator).await.unwrap_err();
    assert_eq!(err.denial(), Some(Denial::NotValidator));
}

#[tokio::test]
async fn test_single_certifier_document_cannot_be_suspended_once_signed() {
    let fx = LedgerFixture::with_mode(CertificationMode::SingleCertifier);
    let id = fx.create_staffed_document().await.unwrap();
    let second = Principal::from("second-validator");
    fx.ledger.grant(id, &fx.owner, &second, Role::Validator).await.unwrap();

    // Suspending before certification is fine; the first signature reactivates.
    fx.ledger.suspend(id, &fx.owner).await.unwrap();
    fx.ledger.sign(id, &fx.validator).await.unwrap();
    let events_before = fx.events().len();

    let err = fx.ledger.suspend(id, &fx.owner).await.unwrap_err();
    assert!(matches!(err, LedgerError::CertificationFinal(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(fx.events().len(), events_before);

    for caller in [&fx.validator, &second] {
        let err = fx.ledger.sign(id, caller).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadySigned);
    }
    let status = fx.ledger.signature_status(id, &fx.owner).await.unwrap();
    assert_eq!(status.status, DocumentStatus::Active);
    assert_eq!(status.signed_count(), 1);

    // Revocation is still available to the owner.
    fx.ledger.revoke(id, &fx.owner).await.unwrap();
}

#[tokio::test]
async fn test_multi_validator_suspended_document_reactivates_on_new_signature() {
    let fx = LedgerFixture::new();
    let id = fx.create_staffed_document().await.unwrap();
    fx.ledger.sign(id, &fx.validator).await.unwrap();
    fx.ledger.suspend(id, &fx.owner).await.unwrap();

    let other = Principal::from("other-validator");
    fx.ledger.grant(id, &fx.owner, &other, Role::Validator).await.unwrap();
    fx.ledger.sign(id, &other).await.unwrap();

    let summary = fx.ledger.summary(id, &fx.owner).await.unwrap();
    assert_eq!(summary.status, DocumentStatus::Active);
}
