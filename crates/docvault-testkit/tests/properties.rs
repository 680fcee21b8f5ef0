//! Property tests over random operation sequences.

use std::future::Future;

use proptest::prelude::*;

use docvault::{CertificationMode, Denial, DocumentStatus, ErrorKind, LedgerError, Principal};
use docvault_testkit::generators::{certification_mode, null_principal};
use docvault_testkit::{ops, Actor, LedgerFixture, Op};

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn version_count_grows_by_one_per_successful_update(mode in certification_mode(), ops in ops(40)) {
        block_on(async {
            let fx = LedgerFixture::with_mode(mode);
            let id = fx.create_staffed_document().await.unwrap();
            let mut expected = 1u64;

            for op in &ops {
                let ok = fx.apply(id, op).await.is_ok();
                if ok && matches!(op, Op::Update { .. }) {
                    expected += 1;
                }
                let snapshot = fx.snapshot(id).await.unwrap();
                prop_assert!(!snapshot.history.is_empty());
                prop_assert_eq!(snapshot.history.len() as u64, expected);
            }

            let owner = fx.snapshot(id).await.unwrap().head.record.owner;
            prop_assert_eq!(fx.ledger.verify_history(id, &owner).await.unwrap(), expected);
            Ok(())
        })?;
    }

    #[test]
    fn failures_change_nothing_and_emit_nothing(mode in certification_mode(), ops in ops(40)) {
        block_on(async {
            let fx = LedgerFixture::with_mode(mode);
            let id = fx.create_staffed_document().await.unwrap();

            for op in &ops {
                let before = fx.snapshot(id).await.unwrap();
                let events_before = fx.sink.len();

                match fx.apply(id, op).await {
                    Err(_) => {
                        prop_assert_eq!(fx.snapshot(id).await.unwrap(), before);
                        prop_assert_eq!(fx.sink.len(), events_before);
                    }
                    Ok(()) => {
                        // At most one event per operation; no-ops emit none.
                        prop_assert!(fx.sink.len() <= events_before + 1);
                    }
                }
            }
            Ok(())
        })?;
    }

    #[test]
    fn revoked_is_terminal(ops in ops(30)) {
        block_on(async {
            let fx = LedgerFixture::new();
            let id = fx.create_staffed_document().await.unwrap();
            fx.ledger.revoke(id, &fx.owner).await.unwrap();

            for op in &ops {
                let result = fx.apply(id, op).await;
                let owner = fx.snapshot(id).await.unwrap().head.record.owner;

                if let (Op::Update { .. } | Op::Sign { .. }, Ok(())) = (op, &result) {
                    prop_assert!(false, "{:?} succeeded on a revoked document", op);
                }
                // Authorized callers are told the document is revoked.
                if let Op::Update { actor, content_id, .. } = op {
                    let caller = fx.principal(*actor);
                    if caller == owner && !content_id.is_empty() {
                        prop_assert!(matches!(result, Err(LedgerError::DocumentRevoked(_))));
                    }
                }
                prop_assert_eq!(
                    fx.snapshot(id).await.unwrap().head.record.status,
                    DocumentStatus::Revoked
                );
            }
            Ok(())
        })?;
    }

    #[test]
    fn queries_leave_state_identical(ops in ops(20), caller in any::<Actor>()) {
        block_on(async {
            let fx = LedgerFixture::new();
            let id = fx.create_staffed_document().await.unwrap();
            for op in &ops {
                let _ = fx.apply(id, op).await;
            }

            let before = fx.snapshot(id).await.unwrap();
            let events_before = fx.sink.len();
            let caller = fx.principal(caller);

            let _ = fx.ledger.summary(id, &caller).await;
            let _ = fx.ledger.latest_version(id, &caller).await;
            let _ = fx.ledger.version_count(id, &caller).await;
            let _ = fx.ledger.version(id, &caller, 0).await;
            let _ = fx.ledger.history(id, &caller).await;
            let _ = fx.ledger.verify_history(id, &caller).await;
            let _ = fx.ledger.list_editors(id, &caller).await;
            let _ = fx.ledger.list_validators(id, &caller).await;
            let _ = fx.ledger.list_readers(id, &caller).await;
            let _ = fx.ledger.roles_of(id, &caller, &fx.editor).await;
            let _ = fx.ledger.signature_status(id, &caller).await;
            let _ = fx.ledger.documents_owned_by(&caller, &caller).await;
            let _ = fx.ledger.authorize(id, &caller, docvault::Capability::CanRead).await;

            prop_assert_eq!(fx.snapshot(id).await.unwrap(), before);
            prop_assert_eq!(fx.sink.len(), events_before);
            Ok(())
        })?;
    }

    #[test]
    fn transfer_to_null_always_fails(null in null_principal(), ops in ops(20)) {
        block_on(async {
            let fx = LedgerFixture::new();
            let id = fx.create_staffed_document().await.unwrap();
            for op in &ops {
                let _ = fx.apply(id, op).await;
            }

            let owner = fx.snapshot(id).await.unwrap().head.record.owner;
            let err = fx.ledger.transfer_ownership(id, &owner, &null).await.unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::InvalidArgument);
            prop_assert_eq!(fx.snapshot(id).await.unwrap().head.record.owner, owner);
            Ok(())
        })?;
    }

    #[test]
    fn single_certifier_accepts_exactly_one(signers in prop::collection::vec(0usize..4, 1..12)) {
        block_on(async {
            let fx = LedgerFixture::with_mode(CertificationMode::SingleCertifier);
            let id = fx.create_document().await.unwrap();
            let validators: Vec<Principal> =
                (0..4).map(|i| Principal::from(format!("val-{i}"))).collect();
            for v in &validators {
                fx.ledger.grant(id, &fx.owner, v, docvault::Role::Validator).await.unwrap();
            }

            for (n, &i) in signers.iter().enumerate() {
                let result = fx.ledger.sign(id, &validators[i]).await;
                if n == 0 {
                    prop_assert!(result.is_ok());
                } else {
                    prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::AlreadySigned);
                }
                let status = fx.ledger.signature_status(id, &fx.owner).await.unwrap();
                prop_assert_eq!(status.status, DocumentStatus::Active);
                prop_assert_eq!(status.signed_count(), 1);
            }
            Ok(())
        })?;
    }

    #[test]
    fn multi_validator_one_signature_each(signers in prop::collection::vec(0usize..4, 1..12)) {
        block_on(async {
            let fx = LedgerFixture::new();
            let id = fx.create_document().await.unwrap();
            let validators: Vec<Principal> =
                (0..4).map(|i| Principal::from(format!("val-{i}"))).collect();
            for v in &validators {
                fx.ledger.grant(id, &fx.owner, v, docvault::Role::Validator).await.unwrap();
            }

            let mut signed = std::collections::HashSet::new();
            for &i in &signers {
                let result = fx.ledger.sign(id, &validators[i]).await;
                if signed.insert(i) {
                    prop_assert!(result.is_ok());
                } else {
                    prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::AlreadySigned);
                }
            }

            let status = fx.ledger.signature_status(id, &fx.owner).await.unwrap();
            prop_assert_eq!(status.signed_count(), signed.len());
            prop_assert_eq!(status.status, DocumentStatus::Active);
            Ok(())
        })?;
    }

    #[test]
    fn single_certified_documents_stay_active(ops in ops(40)) {
        block_on(async {
            let fx = LedgerFixture::with_mode(CertificationMode::SingleCertifier);
            let id = fx.create_staffed_document().await.unwrap();

            for op in &ops {
                let _ = fx.apply(id, op).await;
                let record = fx.snapshot(id).await.unwrap().head.record;
                if !record.certification.is_empty() {
                    prop_assert!(
                        matches!(record.status, DocumentStatus::Active | DocumentStatus::Revoked),
                        "certified document reached {:?} after {:?}",
                        record.status,
                        op
                    );
                }
            }
            Ok(())
        })?;
    }

    #[test]
    fn revoke_is_idempotent_and_always_gated(caller in any::<Actor>()) {
        block_on(async {
            let fx = LedgerFixture::new();
            let id = fx.create_staffed_document().await.unwrap();
            let caller = fx.principal(caller);

            for _ in 0..2 {
                let result = fx.ledger.revoke(id, &caller).await;
                if caller == fx.owner {
                    prop_assert!(result.is_ok());
                } else {
                    prop_assert_eq!(result.unwrap_err().denial(), Some(Denial::NotOwner));
                }
            }
            // Revoke once more as the owner; the stranger is still refused afterwards.
            fx.ledger.revoke(id, &fx.owner).await.unwrap();
            let err = fx.ledger.revoke(id, &fx.stranger).await.unwrap_err();
            prop_assert_eq!(err.denial(), Some(Denial::NotOwner));

            let revocations = fx
                .events()
                .iter()
                .filter(|e| e.name() == "document_revoked")
                .count();
            prop_assert_eq!(revocations, 1);
            Ok(())
        })?;
    }
}
