//! Member entity and its recorded role flags

use crate::value_objects::Snowflake;

/// Member of a guild as tracked by the bot
///
/// Not the live platform member: only the audit read cursor lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub guild_id: Snowflake,
    pub member_id: Snowflake,
    /// ID of the most recent audit entry folded into this member's flags
    pub role_updated_at: Option<Snowflake>,
}

impl Member {
    /// Create a member that has never been read from the audit trail
    pub fn new(guild_id: Snowflake, member_id: Snowflake) -> Self {
        Self {
            guild_id,
            member_id,
            role_updated_at: None,
        }
    }

    /// Whether the member's flags have ever been read from the audit trail
    #[inline]
    pub fn has_cursor(&self) -> bool {
        self.role_updated_at.is_some()
    }
}

/// Last known add/remove state of one role for one member
///
/// `flag == true` means the most recent trail event for this member and role
/// was an add. This is not live membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRoleFlag {
    pub guild_id: Snowflake,
    pub member_id: Snowflake,
    pub role_id: Snowflake,
    pub flag: bool,
}
