//! Membership platform port
//!
//! Every method is an explicit, possibly failing fetch or mutation against the
//! platform. Nothing returned here stays valid across later suspension points.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::entities::{AuditEntry, AuditLogKind, BotAuthority, LiveMember, LiveRole};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, DomainError>;

/// Which side of the cursor to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditDirection {
    /// Entries strictly older than the cursor (or the newest entries without one)
    #[default]
    Before,
    /// Entries strictly newer than the cursor
    After,
}

/// One audit page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditLogQuery {
    pub kind: AuditLogKind,
    pub direction: AuditDirection,
    pub cursor: Option<Snowflake>,
    pub limit: u8,
}

impl AuditLogQuery {
    /// Largest page the platform serves
    pub const MAX_LIMIT: u8 = 100;

    pub fn new(kind: AuditLogKind, direction: AuditDirection, cursor: Option<Snowflake>) -> Self {
        Self {
            kind,
            direction,
            cursor,
            limit: Self::MAX_LIMIT,
        }
    }

    /// Same query, moved to another cursor
    pub fn with_cursor(self, cursor: Snowflake) -> Self {
        Self {
            cursor: Some(cursor),
            ..self
        }
    }
}

#[async_trait]
pub trait MembershipPlatform: Send + Sync {
    /// Fetch one page of audit entries, in the platform's own order
    async fn fetch_audit_entries(
        &self,
        guild_id: Snowflake,
        query: &AuditLogQuery,
    ) -> PlatformResult<Vec<AuditEntry>>;

    /// List every current member with their live roles
    async fn list_members(&self, guild_id: Snowflake) -> PlatformResult<Vec<LiveMember>>;

    /// Live role set of one member (`MemberNotFound` if not in the guild)
    async fn get_member_live_roles(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
    ) -> PlatformResult<BTreeSet<Snowflake>>;

    /// Replace a member's whole role set atomically
    async fn replace_member_roles(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
        role_ids: &BTreeSet<Snowflake>,
        reason: &str,
    ) -> PlatformResult<()>;

    /// The bot's own position and role-management permission
    async fn get_bot_authority(&self, guild_id: Snowflake) -> PlatformResult<BotAuthority>;

    /// Every role of the guild
    async fn list_roles(&self, guild_id: Snowflake) -> PlatformResult<Vec<LiveRole>>;
}
