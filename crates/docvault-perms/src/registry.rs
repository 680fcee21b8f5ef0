//! Permission registry: per-document role sets.
//!
//! Grants are membership facts `(principal, role)`. Granting a held role and
//! revoking an absent one are no-ops. Enumeration follows grant order so that
//! listings are deterministic.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use docvault_core::Principal;

use crate::error::{PermsError, Result};
use crate::role::Role;

/// A single membership fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Who holds the role.
    pub principal: Principal,

    /// Which role.
    pub role: Role,

    /// Grant order within the document (strictly increasing).
    pub seq: u64,

    /// When the role was granted (Unix ms).
    pub granted_at: i64,
}

/// Role sets of one document.
///
/// The owner is not stored here; ownership is evaluated by the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionRegistry {
    /// Index: (principal, role) -> grant.
    grants: HashMap<(Principal, Role), RoleGrant>,

    /// Next grant sequence number.
    next_seq: u64,
}

impl PermissionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a registry from stored grants.
    ///
    /// Later sequence numbers win if the same membership appears twice.
    pub fn from_grants(grants: impl IntoIterator<Item = RoleGrant>) -> Self {
        let mut registry = Self::new();
        for grant in grants {
            registry.next_seq = registry.next_seq.max(grant.seq + 1);
            let key = (grant.principal.clone(), grant.role);
            match registry.grants.get(&key) {
                Some(existing) if existing.seq > grant.seq => {}
                _ => {
                    registry.grants.insert(key, grant);
                }
            }
        }
        registry
    }

    /// Grant `role` to `principal`.
    ///
    /// Returns `true` if membership changed, `false` if it was already held.
    pub fn grant(&mut self, principal: Principal, role: Role, now: i64) -> Result<bool> {
        if principal.is_null() {
            return Err(PermsError::NullPrincipal(role));
        }

        let key = (principal, role);
        if self.grants.contains_key(&key) {
            return Ok(false);
        }

        let grant = RoleGrant {
            principal: key.0.clone(),
            role,
            seq: self.next_seq,
            granted_at: now,
        };
        self.next_seq += 1;
        self.grants.insert(key, grant);
        Ok(true)
    }

    /// Revoke `role` from `principal`.
    ///
    /// Returns `true` if membership changed, `false` if it was not held.
    pub fn revoke(&mut self, principal: &Principal, role: Role) -> bool {
        self.grants.remove(&(principal.clone(), role)).is_some()
    }

    /// Whether `principal` holds `role`.
    pub fn has(&self, principal: &Principal, role: Role) -> bool {
        self.grants.contains_key(&(principal.clone(), role))
    }

    /// Holders of `role`, in grant order.
    pub fn list(&self, role: Role) -> Vec<Principal> {
        let mut held: Vec<&RoleGrant> = self.grants.values().filter(|g| g.role == role).collect();
        held.sort_by_key(|g| g.seq);
        held.into_iter().map(|g| g.principal.clone()).collect()
    }

    /// Roles held by `principal`.
    pub fn roles_of(&self, principal: &Principal) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.has(principal, *role))
            .collect()
    }

    /// All grants, in grant order.
    pub fn grants(&self) -> Vec<&RoleGrant> {
        let mut all: Vec<&RoleGrant> = self.grants.values().collect();
        all.sort_by_key(|g| g.seq);
        all
    }

    /// Number of membership facts.
    pub fn len(&self) -> usize {
        self.grants.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}
