//! Member and role flag database models

use sqlx::FromRow;

/// Database model for members table
#[derive(Debug, Clone, FromRow)]
pub struct MemberModel {
    pub guild_id: i64,
    pub member_id: i64,
    pub role_updated_at: Option<i64>,
}

/// Database model for member_roles table (flag projection only)
#[derive(Debug, Clone, FromRow)]
pub struct MemberRoleFlagModel {
    pub role_id: i64,
    pub flag: bool,
}
