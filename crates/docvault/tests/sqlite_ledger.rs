//! Ledger over an on-disk SQLite store.

use std::sync::Arc;

use docvault::store::SqliteStore;
use docvault::{
    AuditEvent, CertificationMode, DocumentStatus, ErrorKind, Ledger, LedgerConfig, ManualClock,
    MemorySink, Principal, Role, TracingSink,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn open(path: &std::path::Path, mode: CertificationMode) -> (Ledger<SqliteStore>, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let ledger = Ledger::with_clock(
        SqliteStore::open(path).unwrap(),
        LedgerConfig::with_mode(mode),
        Arc::new(ManualClock::new(1_700_000_000_000)),
    )
    .with_sink(sink.clone())
    .with_sink(Arc::new(TracingSink));
    (ledger, sink)
}

#[tokio::test]
async fn test_lifecycle_survives_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    let owner = Principal::from("owner");
    let editor = Principal::from("editor");
    let validator = Principal::from("validator");
    let reader = Principal::from("reader");

    let id = {
        let (ledger, sink) = open(&path, CertificationMode::MultiValidator);
        let id = ledger.create(&owner, "Qm1", "v1").await.unwrap();
        ledger.grant(id, &owner, &editor, Role::Editor).await.unwrap();
        ledger.grant(id, &owner, &validator, Role::Validator).await.unwrap();
        ledger.grant(id, &owner, &reader, Role::Reader).await.unwrap();
        ledger.update(id, &editor, "Qm2", "fix").await.unwrap();
        ledger.sign(id, &validator).await.unwrap();
        assert_eq!(sink.len(), 6);
        id
    };

    let (ledger, sink) = open(&path, CertificationMode::MultiValidator);

    let summary = ledger.summary(id, &reader).await.unwrap();
    assert_eq!(summary.status, DocumentStatus::Active);
    assert_eq!(summary.latest_note, "fix");
    assert_eq!(summary.version_count, 2);
    assert_eq!(ledger.verify_history(id, &reader).await.unwrap(), 2);

    let status = ledger.signature_status(id, &owner).await.unwrap();
    assert_eq!(status.validators.len(), 1);
    assert!(status.validators[0].has_signed());

    // Re-signing is still refused after reopening.
    let err = ledger.sign(id, &validator).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadySigned);

    // The id counter continues.
    let next = ledger.create(&owner, "Qm9", "second").await.unwrap();
    assert_eq!(next.get(), id.get() + 1);
    assert!(matches!(sink.events()[0], AuditEvent::DocumentCreated { .. }));
}

#[tokio::test]
async fn test_single_certifier_over_sqlite() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (ledger, _) = open(&dir.path().join("single.db"), CertificationMode::SingleCertifier);

    let owner = Principal::from("owner");
    let id = ledger.create(&owner, "Qm1", "").await.unwrap();
    for v in ["a", "b"] {
        ledger.grant(id, &owner, &Principal::from(v), Role::Validator).await.unwrap();
    }

    ledger.sign(id, &Principal::from("a")).await.unwrap();
    let err = ledger.sign(id, &Principal::from("b")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadySigned);

    let status = ledger.signature_status(id, &owner).await.unwrap();
    assert_eq!(status.signed_count(), 1);
    assert_eq!(status.signatures[0].validator, Principal::from("a"));
}

#[tokio::test]
async fn test_failed_operations_leave_no_trace() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (ledger, sink) = open(&dir.path().join("noop.db"), CertificationMode::MultiValidator);

    let owner = Principal::from("owner");
    let id = ledger.create(&owner, "Qm1", "").await.unwrap();
    let before = ledger.summary(id, &owner).await.unwrap();

    let stranger = Principal::from("stranger");
    assert!(ledger.update(id, &stranger, "Qm2", "").await.is_err());
    assert!(ledger.sign(id, &stranger).await.is_err());
    assert!(ledger.transfer_ownership(id, &owner, &Principal::null()).await.is_err());
    assert!(ledger.update(id, &owner, "", "").await.is_err());

    assert_eq!(ledger.summary(id, &owner).await.unwrap(), before);
    assert_eq!(sink.len(), 1);
}
