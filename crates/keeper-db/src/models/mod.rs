//! Database models - SQLx-compatible structs for PostgreSQL tables

mod guild;
mod member;
mod rule;

pub use guild::GuildModel;
pub use member::{MemberModel, MemberRoleFlagModel};
pub use rule::RoleRuleModel;
