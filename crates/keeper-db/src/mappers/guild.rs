//! Guild mapper

use keeper_core::entities::{Guild, WelcomeMessage};
use keeper_core::value_objects::Snowflake;

use crate::models::GuildModel;

impl From<GuildModel> for Guild {
    fn from(model: GuildModel) -> Self {
        let welcome = match (model.welcome_msg, model.welcome_channel_id) {
            (Some(message), Some(channel_id)) => Some(WelcomeMessage {
                channel_id: Snowflake::new(channel_id),
                message,
            }),
            _ => None,
        };

        Guild {
            id: Snowflake::new(model.guild_id),
            mark_role_id: model.mark_role_id.map(Snowflake::new),
            last_audit_cursor: model.last_audit_cursor.map(Snowflake::new),
            welcome,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
