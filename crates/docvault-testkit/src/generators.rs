//! Proptest generators for property-based testing.

use proptest::prelude::*;

use docvault_core::{CertificationMode, ContentId, Principal, VersionDraft};
use docvault_perms::Role;

/// Generate a non-null principal handle.
pub fn principal() -> impl Strategy<Value = Principal> {
    "[a-z][a-z0-9-]{0,15}".prop_map(Principal::from)
}

/// Generate a null principal in one of its spellings.
pub fn null_principal() -> impl Strategy<Value = Principal> {
    prop_oneof![Just(""), Just(" "), Just("\t\n")].prop_map(Principal::from)
}

/// Generate a non-empty content identifier.
pub fn content_id() -> impl Strategy<Value = ContentId> {
    "Qm[1-9A-HJ-NP-Za-km-z]{4,44}".prop_map(ContentId::from)
}

/// Generate a free-text note (possibly empty).
pub fn note() -> impl Strategy<Value = String> {
    "[ -~]{0,40}".prop_map(String::from)
}

/// Generate a role.
pub fn role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Editor), Just(Role::Validator), Just(Role::Reader)]
}

/// Generate a certification mode.
pub fn certification_mode() -> impl Strategy<Value = CertificationMode> {
    prop_oneof![
        Just(CertificationMode::MultiValidator),
        Just(CertificationMode::SingleCertifier),
    ]
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=i64::MAX / 2
}

/// Generate a version draft.
pub fn version_draft() -> impl Strategy<Value = VersionDraft> {
    (content_id(), principal(), note())
        .prop_map(|(cid, author, note)| VersionDraft::new(cid, author, note))
}

/// One of the fixture principals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    Owner,
    Editor,
    Validator,
    Reader,
    Stranger,
    Null,
}

impl Arbitrary for Actor {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        // The null principal is rarer so that most operations hit the gate.
        prop_oneof![
            3 => Just(Actor::Owner),
            3 => Just(Actor::Editor),
            3 => Just(Actor::Validator),
            2 => Just(Actor::Reader),
            2 => Just(Actor::Stranger),
            1 => Just(Actor::Null),
        ]
        .boxed()
    }
}

/// A mutating ledger operation performed by an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Update {
        actor: Actor,
        content_id: String,
        note: String,
    },
    Sign {
        actor: Actor,
    },
    Revoke {
        actor: Actor,
    },
    Suspend {
        actor: Actor,
    },
    Transfer {
        actor: Actor,
        to: Actor,
    },
    Grant {
        actor: Actor,
        to: Actor,
        role: Role,
    },
    RevokeRole {
        actor: Actor,
        from: Actor,
        role: Role,
    },
}

impl Op {
    /// Who performs the operation.
    pub fn actor(&self) -> Actor {
        match self {
            Op::Update { actor, .. }
            | Op::Sign { actor }
            | Op::Revoke { actor }
            | Op::Suspend { actor }
            | Op::Transfer { actor, .. }
            | Op::Grant { actor, .. }
            | Op::RevokeRole { actor, .. } => *actor,
        }
    }
}

impl Arbitrary for Op {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        let actor = any::<Actor>();
        // Occasionally empty, to exercise argument validation.
        let cid = prop_oneof![
            9 => "Qm[a-zA-Z0-9]{4,12}".prop_map(String::from),
            1 => Just(String::new()),
        ];

        prop_oneof![
            6 => (actor.clone(), cid, note()).prop_map(|(actor, content_id, note)| Op::Update {
                actor,
                content_id,
                note
            }),
            4 => actor.clone().prop_map(|actor| Op::Sign { actor }),
            1 => actor.clone().prop_map(|actor| Op::Revoke { actor }),
            1 => actor.clone().prop_map(|actor| Op::Suspend { actor }),
            1 => (actor.clone(), any::<Actor>()).prop_map(|(actor, to)| Op::Transfer { actor, to }),
            3 => (actor.clone(), any::<Actor>(), role())
                .prop_map(|(actor, to, role)| Op::Grant { actor, to, role }),
            2 => (actor, any::<Actor>(), role())
                .prop_map(|(actor, from, role)| Op::RevokeRole { actor, from, role }),
        ]
        .boxed()
    }
}

/// Generate a sequence of up to `max_len` operations.
pub fn ops(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(any::<Op>(), 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn principals_are_never_null(p in principal()) {
            prop_assert!(!p.is_null());
        }

        #[test]
        fn null_principals_are_null(p in null_principal()) {
            prop_assert!(p.is_null());
        }

        #[test]
        fn content_ids_are_never_empty(cid in content_id()) {
            prop_assert!(!cid.is_empty());
        }
    }
}
