//! Repository traits (ports) - define the interface for data access
//!
//! Reads that name a guild or member materialize the row when it is missing;
//! they never fail because a row does not exist yet. Failing remote fetches
//! live on [`MembershipPlatform`](super::MembershipPlatform) instead.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use crate::entities::{Guild, Member, PersistentRoleRule, WelcomeMessage};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Guild Repository
// ============================================================================

#[async_trait]
pub trait GuildRepository: Send + Sync {
    /// Get the guild, creating an unconfigured row if absent
    async fn get_or_create(&self, id: Snowflake) -> RepoResult<Guild>;

    /// List every guild with a mark role configured
    async fn find_initialized(&self) -> RepoResult<Vec<Guild>>;

    /// Set the mark role unless a different one is already stored
    ///
    /// Check and write happen in one statement. Returns `false` when another
    /// mark role was kept.
    async fn set_mark_role(&self, id: Snowflake, role_id: Snowflake) -> RepoResult<bool>;

    /// Set or clear the welcome message
    async fn set_welcome(&self, id: Snowflake, welcome: Option<&WelcomeMessage>) -> RepoResult<()>;
}

// ============================================================================
// Persistent Role Rule Repository
// ============================================================================

#[async_trait]
pub trait RoleRuleRepository: Send + Sync {
    /// Create the rule or update its default value
    async fn upsert(&self, rule: &PersistentRoleRule) -> RepoResult<()>;

    /// Delete a rule, returning whether it existed
    async fn delete(&self, guild_id: Snowflake, role_id: Snowflake) -> RepoResult<bool>;

    /// List all rules of a guild
    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<PersistentRoleRule>>;
}

// ============================================================================
// Role State Store
// ============================================================================

/// Persisted (guild, member, role) flags plus the audit read cursors
///
/// Cursor setters are monotonic: writing an older ID than the stored one
/// leaves the stored cursor untouched.
#[async_trait]
pub trait RoleStateStore: Send + Sync {
    /// Get the member, creating it with a null cursor if absent
    async fn get_member(&self, guild_id: Snowflake, member_id: Snowflake) -> RepoResult<Member>;

    /// Get the member's audit cursor
    async fn get_cursor(&self, guild_id: Snowflake, member_id: Snowflake)
        -> RepoResult<Option<Snowflake>>;

    /// Advance the member's audit cursor
    async fn set_cursor(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
        audit_id: Snowflake,
    ) -> RepoResult<()>;

    /// Get the guild-wide sweep cursor
    async fn get_guild_cursor(&self, guild_id: Snowflake) -> RepoResult<Option<Snowflake>>;

    /// Advance the guild-wide sweep cursor
    async fn set_guild_cursor(&self, guild_id: Snowflake, audit_id: Snowflake) -> RepoResult<()>;

    /// Stored flags for `role_ids`; roles without a row are absent from the map
    async fn get_flags(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
        role_ids: &[Snowflake],
    ) -> RepoResult<HashMap<Snowflake, bool>>;

    /// Upsert every flag in one transaction
    async fn set_flags(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
        flags: &HashMap<Snowflake, bool>,
    ) -> RepoResult<()>;

    /// Delete every flag of the guild, returning the number of rows removed
    async fn delete_all_flags(&self, guild_id: Snowflake) -> RepoResult<u64>;

    /// Wipe the guild's flags and write `flags` in its place, in one
    /// transaction; returns the number of rows removed by the wipe
    ///
    /// On error the previous flags are left as they were.
    async fn replace_all_flags(
        &self,
        guild_id: Snowflake,
        flags: &BTreeMap<Snowflake, HashMap<Snowflake, bool>>,
    ) -> RepoResult<u64>;
}
