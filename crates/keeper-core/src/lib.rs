//! # keeper-core
//!
//! Domain layer containing entities, value objects, and the ports the
//! reconciliation engine needs from storage and from the membership platform.
//! This crate has zero dependencies on infrastructure (database, HTTP, etc.).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    effective_flags, AuditEntry, AuditLogKind, BotAuthority, Guild, LiveMember, LiveRole, Member,
    MemberRoleFlag, PersistentRoleRule, RoleChange, RoleChangeKind, WelcomeMessage,
};
pub use error::DomainError;
pub use traits::{
    AuditDirection, AuditLogQuery, GuildRepository, MembershipPlatform, PlatformResult,
    RepoResult, RoleRuleRepository, RoleStateStore,
};
pub use value_objects::{Permissions, Snowflake, SnowflakeParseError};
