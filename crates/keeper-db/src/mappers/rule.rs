//! Persistent role rule mapper

use keeper_core::entities::PersistentRoleRule;
use keeper_core::value_objects::Snowflake;

use crate::models::RoleRuleModel;

impl From<RoleRuleModel> for PersistentRoleRule {
    fn from(model: RoleRuleModel) -> Self {
        PersistentRoleRule::new(
            Snowflake::new(model.guild_id),
            Snowflake::new(model.role_id),
            model.default_value,
        )
    }
}
