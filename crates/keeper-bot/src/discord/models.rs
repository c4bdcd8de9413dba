//! Wire payloads for the Discord REST API
//!
//! Only the fields the bot reads are declared; unknown fields are ignored.

use std::collections::BTreeSet;
use std::time::Duration;

use keeper_core::entities::{AuditEntry, LiveMember, LiveRole, RoleChange, RoleChangeKind};
use keeper_core::error::DomainError;
use keeper_core::value_objects::{Permissions, Snowflake};
use serde::Deserialize;

/// `GET /guilds/{id}/audit-logs`
#[derive(Debug, Clone, Deserialize)]
pub struct AuditLogPage {
    #[serde(default)]
    pub audit_log_entries: Vec<AuditLogEntryPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditLogEntryPayload {
    pub id: Snowflake,
    #[serde(default)]
    pub target_id: Option<Snowflake>,
    #[serde(default)]
    pub changes: Vec<AuditLogChangePayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditLogChangePayload {
    pub key: String,
    #[serde(default)]
    pub new_value: Option<serde_json::Value>,
}

/// Role reference inside a `$add` / `$remove` change
#[derive(Debug, Clone, Deserialize)]
pub struct PartialRolePayload {
    pub id: Snowflake,
}

impl AuditLogChangePayload {
    /// Role change carried by this entry, `None` for unrelated keys
    ///
    /// A `$add` / `$remove` whose value is not a role list is an error, never
    /// an empty change.
    fn into_role_change(self, entry_id: Snowflake) -> Result<Option<RoleChange>, DomainError> {
        let Some(kind) = RoleChangeKind::from_key(&self.key) else {
            return Ok(None);
        };
        let roles: Vec<PartialRolePayload> =
            serde_json::from_value(self.new_value.unwrap_or_default()).map_err(|e| {
                DomainError::Platform(format!(
                    "audit entry {entry_id}: malformed {} change: {e}",
                    self.key
                ))
            })?;

        Ok(Some(RoleChange {
            kind,
            roles: roles.into_iter().map(|role| role.id).collect(),
        }))
    }
}

impl TryFrom<AuditLogEntryPayload> for AuditEntry {
    type Error = DomainError;

    fn try_from(payload: AuditLogEntryPayload) -> Result<Self, Self::Error> {
        let id = payload.id;
        let changes = payload
            .changes
            .into_iter()
            .filter_map(|change| change.into_role_change(id).transpose())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AuditEntry {
            id,
            target_id: payload.target_id,
            changes,
        })
    }
}

/// `GET /guilds/{id}/roles` element
#[derive(Debug, Clone, Deserialize)]
pub struct RolePayload {
    pub id: Snowflake,
    pub position: i32,
    #[serde(default)]
    pub permissions: Permissions,
}

impl From<RolePayload> for LiveRole {
    fn from(payload: RolePayload) -> Self {
        LiveRole {
            id: payload.id,
            position: payload.position,
            permissions: payload.permissions,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub id: Snowflake,
}

/// Guild member object
#[derive(Debug, Clone, Deserialize)]
pub struct MemberPayload {
    #[serde(default)]
    pub user: Option<UserPayload>,
    #[serde(default)]
    pub roles: BTreeSet<Snowflake>,
}

impl MemberPayload {
    /// Live view of the member; `None` when the payload carries no user
    pub fn into_live(self) -> Option<LiveMember> {
        self.user.map(|user| LiveMember {
            id: user.id,
            role_ids: self.roles,
        })
    }
}

/// Body of a 429 response
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitPayload {
    /// Seconds to wait before retrying
    pub retry_after: f64,
    #[serde(default)]
    pub global: bool,
}

impl RateLimitPayload {
    const MAX_WAIT: Duration = Duration::from_secs(60);

    pub fn wait(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_after)
            .unwrap_or(Self::MAX_WAIT)
            .min(Self::MAX_WAIT)
    }
}
