//! Member service
//!
//! Entry points for membership events and per-member queries.

use std::collections::BTreeMap;

use keeper_core::entities::effective_flags;
use keeper_core::value_objects::Snowflake;
use tracing::{debug, instrument};

use crate::applier::ApplyOutcome;

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::sweep::SweepService;

const REJOIN_REASON: &str = "member rejoined";

/// Member service
pub struct MemberService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MemberService<'a> {
    /// Create a new MemberService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Restore a joining member's persistent roles
    ///
    /// Returns `None` when the guild has no mark role yet.
    #[instrument(skip(self))]
    pub async fn on_member_join(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
    ) -> ServiceResult<Option<ApplyOutcome>> {
        let guild = self.ctx.guild_repo().get_or_create(guild_id).await?;
        if !guild.is_initialized() {
            debug!(%guild_id, "Guild not initialised, ignoring join");
            return Ok(None);
        }

        SweepService::new(self.ctx)
            .refresh_member(guild_id, member_id)
            .await?;
        let outcome = self
            .ctx
            .applier()
            .apply_desired_roles(guild_id, member_id, REJOIN_REASON)
            .await?;
        Ok(Some(outcome))
    }

    /// Effective flag of every persistent role for one member
    ///
    /// The member's flags are brought up to date from the trail first.
    #[instrument(skip(self))]
    pub async fn effective_roles(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
    ) -> ServiceResult<BTreeMap<Snowflake, bool>> {
        SweepService::new(self.ctx)
            .refresh_member(guild_id, member_id)
            .await?;

        let rules = self.ctx.rule_repo().find_by_guild(guild_id).await?;
        let role_ids: Vec<Snowflake> = rules.iter().map(|rule| rule.role_id).collect();
        let stored = self
            .ctx
            .state_store()
            .get_flags(guild_id, member_id, &role_ids)
            .await?;

        Ok(effective_flags(&rules, &stored))
    }
}
