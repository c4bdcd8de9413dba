//! Ports - interfaces the domain needs from infrastructure

mod platform;
mod repositories;

pub use platform::{AuditDirection, AuditLogQuery, MembershipPlatform, PlatformResult};
pub use repositories::{GuildRepository, RepoResult, RoleRuleRepository, RoleStateStore};
