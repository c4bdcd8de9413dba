//! Guild entity - one external community managed by the bot

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Welcome message configuration (owned by the welcome feature)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WelcomeMessage {
    pub channel_id: Snowflake,
    pub message: String,
}

/// Guild entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: Snowflake,
    /// Sentinel role whose presence means "this member is bot-managed"
    pub mark_role_id: Option<Snowflake>,
    /// Highest audit entry ID folded by a guild-wide sweep
    pub last_audit_cursor: Option<Snowflake>,
    pub welcome: Option<WelcomeMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guild {
    /// Create a new, unconfigured Guild
    pub fn new(id: Snowflake) -> Self {
        let now = Utc::now();
        Self {
            id,
            mark_role_id: None,
            last_audit_cursor: None,
            welcome: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `init` has configured a mark role
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.mark_role_id.is_some()
    }

    /// Whether `role_id` may become the mark role
    ///
    /// The mark role is set once; re-initialising with the same role is allowed.
    pub fn accepts_mark_role(&self, role_id: Snowflake) -> bool {
        self.mark_role_id.is_none_or(|current| current == role_id)
    }

    /// Set the mark role
    pub fn set_mark_role(&mut self, role_id: Snowflake) {
        self.mark_role_id = Some(role_id);
        self.updated_at = Utc::now();
    }

    /// Set or clear the welcome message
    ///
    /// Both parts must be present, otherwise the welcome message is cleared.
    pub fn set_welcome(&mut self, message: Option<String>, channel_id: Option<Snowflake>) {
        self.welcome = match (message, channel_id) {
            (Some(message), Some(channel_id)) if !message.is_empty() => {
                Some(WelcomeMessage { channel_id, message })
            }
            _ => None,
        };
        self.updated_at = Utc::now();
    }
}
