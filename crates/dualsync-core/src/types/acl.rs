//! Object Access Control List (ACL) types
//!
//! An object ACL is a set of `{entity, role}` grants. Order carries no
//! meaning, so ACLs are held in a `BTreeSet` and compared as sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Set of grants on one object
pub type Acl = BTreeSet<AclEntry>;

// ============================================================================
// ACL Roles
// ============================================================================

/// Role granted to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AclRole {
    /// Read object data and metadata
    Reader,
    /// Reader plus overwrite
    Writer,
    /// Full control, including the ACL itself
    Owner,
}

impl FromStr for AclRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "READER" | "READ" => Ok(AclRole::Reader),
            "WRITER" | "WRITE" => Ok(AclRole::Writer),
            "OWNER" | "FULL_CONTROL" => Ok(AclRole::Owner),
            _ => Err(format!("Invalid ACL role: {}", s)),
        }
    }
}

impl std::fmt::Display for AclRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AclRole::Reader => write!(f, "READER"),
            AclRole::Writer => write!(f, "WRITER"),
            AclRole::Owner => write!(f, "OWNER"),
        }
    }
}

// ============================================================================
// ACL Entries
// ============================================================================

/// Well-known entity for anonymous access
pub const ALL_USERS: &str = "allUsers";

/// Well-known entity for any authenticated principal
pub const ALL_AUTHENTICATED_USERS: &str = "allAuthenticatedUsers";

/// A single grant
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AclEntry {
    /// Grantee, e.g. `user-jane@example.com`, `project-owners-123`, `allUsers`
    pub entity: String,
    pub role: AclRole,
}

impl AclEntry {
    pub fn new(entity: impl Into<String>, role: AclRole) -> Self {
        Self {
            entity: entity.into(),
            role,
        }
    }

    pub fn user(email: &str, role: AclRole) -> Self {
        Self::new(format!("user-{}", email), role)
    }

    pub fn public_read() -> Self {
        Self::new(ALL_USERS, AclRole::Reader)
    }

    pub fn is_public(&self) -> bool {
        self.entity == ALL_USERS || self.entity == ALL_AUTHENTICATED_USERS
    }
}

impl std::fmt::Display for AclEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.entity, self.role)
    }
}

impl FromStr for AclEntry {
    type Err = String;

    /// Parses `entity:ROLE`. The entity may itself contain `:`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (entity, role) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("Invalid ACL entry (expected entity:ROLE): {}", s))?;
        if entity.is_empty() {
            return Err(format!("Invalid ACL entry (empty entity): {}", s));
        }
        Ok(Self::new(entity, role.parse()?))
    }
}
