//! Roles held in the registry and capabilities checked by the gate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A role a principal may hold on a document.
///
/// A principal may hold any subset of roles at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Role {
    /// May append versions.
    Editor = 0,
    /// May certify.
    Validator = 1,
    /// May read metadata and history.
    Reader = 2,
}

impl Role {
    /// All roles, in storage order.
    pub const ALL: [Role; 3] = [Role::Editor, Role::Validator, Role::Reader];

    /// Convert to u8 for storage.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Try to parse from u8.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Editor),
            1 => Some(Self::Validator),
            2 => Some(Self::Reader),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::Validator => "validator",
            Self::Reader => "reader",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "editor" => Ok(Self::Editor),
            "validator" => Ok(Self::Validator),
            "reader" => Ok(Self::Reader),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A named permission check evaluated against a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Caller is the owner.
    IsOwner,
    /// Owner or editor.
    CanEdit,
    /// Owner or reader.
    CanRead,
    /// Holds the validator role.
    IsValidator,
}

impl Capability {
    /// The role that grants this capability to non-owners, if any.
    pub fn granting_role(self) -> Option<Role> {
        match self {
            Self::IsOwner => None,
            Self::CanEdit => Some(Role::Editor),
            Self::CanRead => Some(Role::Reader),
            Self::IsValidator => Some(Role::Validator),
        }
    }

    /// Whether ownership alone satisfies this capability.
    pub fn owner_satisfies(self) -> bool {
        !matches!(self, Self::IsValidator)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::IsOwner => "is_owner",
            Self::CanEdit => "can_edit",
            Self::CanRead => "can_read",
            Self::IsValidator => "is_validator",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_u8_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::from_u8(role.to_u8()), Some(role));
        }
        assert_eq!(Role::from_u8(7), None);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("validator".parse::<Role>(), Ok(Role::Validator));
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_capability_roles() {
        assert_eq!(Capability::IsOwner.granting_role(), None);
        assert_eq!(Capability::CanEdit.granting_role(), Some(Role::Editor));
        assert!(Capability::CanRead.owner_satisfies());
        assert!(!Capability::IsValidator.owner_satisfies());
    }
}
