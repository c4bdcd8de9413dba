//! Guild configuration service
//!
//! Mark role setup, persistent role rules and the welcome message.

use std::collections::HashMap;

use keeper_core::entities::{LiveRole, PersistentRoleRule, WelcomeMessage};
use keeper_core::error::DomainError;
use keeper_core::value_objects::Snowflake;
use tracing::{info, instrument};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::sweep::{MemberApplyResult, SweepKind, SweepOutcome, SweepService};

const INIT_REASON: &str = "persistent roles initialised";
const ADD_ROLE_REASON: &str = "persistent role added";

/// Guild service
pub struct GuildService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> GuildService<'a> {
    /// Create a new GuildService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Configure the mark role, then sweep the guild and apply every member
    ///
    /// Re-running with the configured mark role is allowed; choosing a
    /// different one is not.
    #[instrument(skip(self))]
    pub async fn init(&self, guild_id: Snowflake, mark_role_id: Snowflake) -> ServiceResult<SweepOutcome> {
        self.ensure_manageable(guild_id, mark_role_id).await?;

        let guilds = self.ctx.guild_repo();
        if !guilds.set_mark_role(guild_id, mark_role_id).await? {
            let current = guilds
                .get_or_create(guild_id)
                .await?
                .mark_role_id
                .unwrap_or(mark_role_id);
            return Err(DomainError::MarkRoleAlreadySet(current).into());
        }
        info!(%guild_id, %mark_role_id, "Mark role configured");

        SweepService::new(self.ctx)
            .refresh_members(guild_id, SweepKind::All, Some(INIT_REASON))
            .await
    }

    /// Add or update a persistent role rule and reapply every member
    ///
    /// Members are only touched once the guild has a mark role.
    #[instrument(skip(self))]
    pub async fn add_role(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
        default_value: bool,
    ) -> ServiceResult<Vec<MemberApplyResult>> {
        self.ensure_manageable(guild_id, role_id).await?;

        self.ctx
            .rule_repo()
            .upsert(&PersistentRoleRule::new(guild_id, role_id, default_value))
            .await?;
        info!(%guild_id, %role_id, default_value, "Persistent role saved");

        let guild = self.ctx.guild_repo().get_or_create(guild_id).await?;
        if !guild.is_initialized() {
            return Ok(Vec::new());
        }

        let members = self.ctx.platform().list_members(guild_id).await?;
        Ok(SweepService::new(self.ctx)
            .apply_members(guild_id, &members, ADD_ROLE_REASON)
            .await)
    }

    /// Stop persisting a role; members keep whatever they hold now
    #[instrument(skip(self))]
    pub async fn del_role(&self, guild_id: Snowflake, role_id: Snowflake) -> ServiceResult<()> {
        if !self.ctx.rule_repo().delete(guild_id, role_id).await? {
            return Err(DomainError::NotPersistentRole(role_id).into());
        }
        info!(%guild_id, %role_id, "Persistent role removed");
        Ok(())
    }

    /// Set the welcome message, or clear it when either part is missing
    #[instrument(skip(self, message))]
    pub async fn set_welcome(
        &self,
        guild_id: Snowflake,
        message: Option<String>,
        channel_id: Option<Snowflake>,
    ) -> ServiceResult<Option<WelcomeMessage>> {
        let mut guild = self.ctx.guild_repo().get_or_create(guild_id).await?;
        guild.set_welcome(message, channel_id);
        self.ctx
            .guild_repo()
            .set_welcome(guild_id, guild.welcome.as_ref())
            .await?;
        Ok(guild.welcome)
    }

    /// List the guild's persistent role rules
    pub async fn rules(&self, guild_id: Snowflake) -> ServiceResult<Vec<PersistentRoleRule>> {
        Ok(self.ctx.rule_repo().find_by_guild(guild_id).await?)
    }

    /// A role the bot may configure: it exists, is not the base role and
    /// sits below the bot
    async fn ensure_manageable(&self, guild_id: Snowflake, role_id: Snowflake) -> ServiceResult<()> {
        let platform = self.ctx.platform();
        let authority = platform.get_bot_authority(guild_id).await?;
        if !authority.has_manage_roles {
            return Err(DomainError::InsufficientAuthority.into());
        }

        let roles: HashMap<Snowflake, LiveRole> = platform
            .list_roles(guild_id)
            .await?
            .into_iter()
            .map(|role| (role.id, role))
            .collect();
        let role = roles
            .get(&role_id)
            .copied()
            .ok_or(DomainError::RoleNotFound(role_id))?;

        if role.is_base() {
            return Err(DomainError::CannotManageRole(role_id).into());
        }
        if !authority.outranks(&role) {
            return Err(DomainError::InsufficientAuthorityForRole(role_id).into());
        }
        Ok(())
    }
}
