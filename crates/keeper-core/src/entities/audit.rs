//! Audit trail entries - read-only records owned by the platform

use crate::value_objects::Snowflake;

/// Kind of audit entry requested from the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditLogKind {
    /// A member's role set was changed
    MemberRoleUpdate,
}

impl AuditLogKind {
    /// Platform action type code
    pub const fn action_type(self) -> u8 {
        match self {
            Self::MemberRoleUpdate => 25,
        }
    }
}

/// Whether a change granted or revoked its roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleChangeKind {
    Add,
    Remove,
}

impl RoleChangeKind {
    /// Parse the platform's change key (`$add` / `$remove`)
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "$add" => Some(Self::Add),
            "$remove" => Some(Self::Remove),
            _ => None,
        }
    }

    /// The flag value this change records
    #[inline]
    pub fn as_flag(self) -> bool {
        matches!(self, Self::Add)
    }
}

/// One add or remove inside an audit entry
///
/// `roles` is ordered least-recent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    pub kind: RoleChangeKind,
    pub roles: Vec<Snowflake>,
}

impl RoleChange {
    pub fn add(roles: impl Into<Vec<Snowflake>>) -> Self {
        Self {
            kind: RoleChangeKind::Add,
            roles: roles.into(),
        }
    }

    pub fn remove(roles: impl Into<Vec<Snowflake>>) -> Self {
        Self {
            kind: RoleChangeKind::Remove,
            roles: roles.into(),
        }
    }
}

/// Audit entry recording role changes on one member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Totally ordered; larger is more recent
    pub id: Snowflake,
    /// Member whose roles changed (absent when the platform dropped it)
    pub target_id: Option<Snowflake>,
    pub changes: Vec<RoleChange>,
}

impl AuditEntry {
    pub fn new(id: Snowflake, target_id: Snowflake, changes: Vec<RoleChange>) -> Self {
        Self {
            id,
            target_id: Some(target_id),
            changes,
        }
    }
}
