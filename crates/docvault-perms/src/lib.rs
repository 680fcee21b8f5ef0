//! # docvault Permissions
//!
//! Per-document role registry and the authorization gate.
//!
//! ## Overview
//!
//! Every document has exactly one owner and three role sets: editors, validators
//! and readers. The owner is never stored in the sets; capabilities are evaluated
//! as a short-circuit OR of ownership and membership:
//!
//! | Capability     | Holds when                  |
//! |----------------|-----------------------------|
//! | `IsOwner`      | caller is the owner         |
//! | `CanEdit`      | owner, or holds `Editor`    |
//! | `CanRead`      | owner, or holds `Reader`    |
//! | `IsValidator`  | holds `Validator`           |
//!
//! Evaluation is pure: [`authorize`] never mutates anything.
//!
//! ## Usage
//!
//! ```rust
//! use docvault_core::Principal;
//! use docvault_perms::{authorize, Capability, Decision, PermissionRegistry, Role};
//!
//! let owner = Principal::from("registry-office");
//! let clerk = Principal::from("clerk");
//!
//! let mut registry = PermissionRegistry::new();
//! registry.grant(clerk.clone(), Role::Editor, 0).unwrap();
//!
//! assert_eq!(authorize(&owner, &registry, &clerk, Capability::CanEdit), Decision::Allowed);
//! assert!(authorize(&owner, &registry, &clerk, Capability::CanRead).is_denied());
//! ```

pub mod error;
pub mod gate;
pub mod registry;
pub mod role;

pub use error::{PermsError, Result};
pub use gate::{authorize, Decision, Denial};
pub use registry::{PermissionRegistry, RoleGrant};
pub use role::{Capability, Role};
