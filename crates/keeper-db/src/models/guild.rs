//! Guild database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for guilds table
#[derive(Debug, Clone, FromRow)]
pub struct GuildModel {
    pub guild_id: i64,
    pub mark_role_id: Option<i64>,
    pub last_audit_cursor: Option<i64>,
    pub welcome_msg: Option<String>,
    pub welcome_channel_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
