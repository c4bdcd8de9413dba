//! Live platform views
//!
//! These are snapshots returned by an explicit platform fetch. They go stale
//! as soon as the fetch returns and must not be kept across other I/O.

use std::collections::BTreeSet;

use crate::value_objects::{Permissions, Snowflake};

/// A role as it currently exists on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveRole {
    pub id: Snowflake,
    /// Hierarchy position; higher means more authority, 0 is the base role
    pub position: i32,
    pub permissions: Permissions,
}

impl LiveRole {
    /// Whether this is the guild's base (`@everyone`) role
    #[inline]
    pub fn is_base(&self) -> bool {
        self.position == 0
    }
}

/// A member as it currently exists on the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveMember {
    pub id: Snowflake,
    pub role_ids: BTreeSet<Snowflake>,
}

/// What the bot itself is allowed to do in a guild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotAuthority {
    /// Position of the bot's highest role
    pub highest_position: i32,
    pub has_manage_roles: bool,
}

impl BotAuthority {
    /// Whether the bot can grant or revoke `role`
    #[inline]
    pub fn outranks(&self, role: &LiveRole) -> bool {
        self.highest_position > role.position
    }
}
