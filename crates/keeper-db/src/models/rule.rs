//! Persistent role rule database model

use sqlx::FromRow;

/// Database model for guild_roles table
#[derive(Debug, Clone, FromRow)]
pub struct RoleRuleModel {
    pub guild_id: i64,
    pub role_id: i64,
    pub default_value: bool,
}
