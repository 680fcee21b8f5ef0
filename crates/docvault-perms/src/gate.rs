//! Authorization gate: evaluate a capability for a caller.
//!
//! The gate is a pure predicate over the document owner and its registry.
//! Callers must consult it before acting and abort on denial.

use std::fmt;

use docvault_core::Principal;

use crate::registry::PermissionRegistry;
use crate::role::Capability;

/// Why a capability check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Denial {
    /// The document does not exist.
    UnknownDocument,
    /// Caller is not the owner.
    NotOwner,
    /// Caller is neither owner nor editor.
    NotEditor,
    /// Caller is neither owner nor reader.
    NotReader,
    /// Caller does not hold the validator role.
    NotValidator,
}

impl Denial {
    /// The denial reported when `capability` fails for an existing document.
    pub fn for_capability(capability: Capability) -> Self {
        match capability {
            Capability::IsOwner => Self::NotOwner,
            Capability::CanEdit => Self::NotEditor,
            Capability::CanRead => Self::NotReader,
            Capability::IsValidator => Self::NotValidator,
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnknownDocument => "unknown document",
            Self::NotOwner => "not the owner",
            Self::NotEditor => "not an editor",
            Self::NotReader => "not a reader",
            Self::NotValidator => "not a validator",
        };
        f.write_str(s)
    }
}

/// Outcome of a capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }

    /// Convert to a `Result` for `?` propagation.
    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied(denial) => Err(denial),
        }
    }
}

/// Evaluate `capability` for `principal` on a document owned by `owner`.
///
/// Ownership short-circuits every capability except `IsValidator`, which is
/// pure membership. The null principal is always denied.
pub fn authorize(
    owner: &Principal,
    registry: &PermissionRegistry,
    principal: &Principal,
    capability: Capability,
) -> Decision {
    let denied = Decision::Denied(Denial::for_capability(capability));

    if principal.is_null() {
        return denied;
    }

    if capability.owner_satisfies() && owner == principal {
        return Decision::Allowed;
    }

    match capability.granting_role() {
        Some(role) if registry.has(principal, role) => Decision::Allowed,
        _ => denied,
    }
}
