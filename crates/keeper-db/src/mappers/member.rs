//! Member and role flag mappers

use std::collections::HashMap;

use keeper_core::entities::Member;
use keeper_core::value_objects::Snowflake;

use crate::models::{MemberModel, MemberRoleFlagModel};

impl From<MemberModel> for Member {
    fn from(model: MemberModel) -> Self {
        Member {
            guild_id: Snowflake::new(model.guild_id),
            member_id: Snowflake::new(model.member_id),
            role_updated_at: model.role_updated_at.map(Snowflake::new),
        }
    }
}

/// Collect flag rows into a role → flag map
pub fn flags_from_rows(rows: Vec<MemberRoleFlagModel>) -> HashMap<Snowflake, bool> {
    rows.into_iter()
        .map(|row| (Snowflake::new(row.role_id), row.flag))
        .collect()
}
