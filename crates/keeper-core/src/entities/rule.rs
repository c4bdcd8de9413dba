//! Persistent role rule - a role the bot re-applies on every reconciliation

use std::collections::{BTreeMap, HashMap};

use crate::value_objects::Snowflake;

/// One configured persistent role of a guild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistentRoleRule {
    pub guild_id: Snowflake,
    pub role_id: Snowflake,
    /// Whether a member with no recorded flag for this role should receive it
    pub default_value: bool,
}

impl PersistentRoleRule {
    pub fn new(guild_id: Snowflake, role_id: Snowflake, default_value: bool) -> Self {
        Self {
            guild_id,
            role_id,
            default_value,
        }
    }

    /// Stored flag if one exists, the rule default otherwise
    #[inline]
    pub fn effective(&self, stored: Option<bool>) -> bool {
        stored.unwrap_or(self.default_value)
    }
}

/// Resolve the effective flag of every rule against a member's stored flags
pub fn effective_flags(
    rules: &[PersistentRoleRule],
    stored: &HashMap<Snowflake, bool>,
) -> BTreeMap<Snowflake, bool> {
    rules
        .iter()
        .map(|rule| (rule.role_id, rule.effective(stored.get(&rule.role_id).copied())))
        .collect()
}
