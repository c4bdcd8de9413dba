//! Role applier
//!
//! Computes a member's desired role set from the persistent rules and the
//! stored flags, then applies it as one replacement. A failure after the
//! original roles were captured restores them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use keeper_core::entities::{effective_flags, BotAuthority, LiveRole, PersistentRoleRule};
use keeper_core::error::DomainError;
use keeper_core::traits::{GuildRepository, MembershipPlatform, RoleRuleRepository, RoleStateStore};
use keeper_core::value_objects::Snowflake;
use tracing::{debug, info, instrument, warn};

/// Reason attached to the replacement that restores a member's roles
pub const ROLLBACK_REASON: &str = "restoring roles after failed update";

/// Roles a successful application granted and revoked
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub added: BTreeSet<Snowflake>,
    pub removed: BTreeSet<Snowflake>,
}

impl ApplyOutcome {
    /// Whether the member already had the desired roles
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Desired role set and its difference from the live one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePlan {
    pub desired: BTreeSet<Snowflake>,
    pub added: BTreeSet<Snowflake>,
    pub removed: BTreeSet<Snowflake>,
}

/// Compute the desired role set
///
/// Starts from `original` so roles without a rule pass through, then sets
/// every ruled role to its effective flag and adds the mark role.
pub fn plan_roles(
    original: &BTreeSet<Snowflake>,
    effective: &BTreeMap<Snowflake, bool>,
    mark_role_id: Snowflake,
) -> RolePlan {
    let mut desired = original.clone();
    for (role_id, held) in effective {
        if *held {
            desired.insert(*role_id);
        } else {
            desired.remove(role_id);
        }
    }
    desired.insert(mark_role_id);

    RolePlan {
        added: desired.difference(original).copied().collect(),
        removed: original.difference(&desired).copied().collect(),
        desired,
    }
}

impl RolePlan {
    /// Every changed role except the mark role must sit below the bot
    fn check_authority(
        &self,
        authority: &BotAuthority,
        roles: &HashMap<Snowflake, LiveRole>,
        mark_role_id: Snowflake,
    ) -> Result<(), DomainError> {
        let changed = self
            .added
            .iter()
            .chain(self.removed.iter())
            .filter(|role_id| **role_id != mark_role_id);

        for role_id in changed {
            let manageable = roles
                .get(role_id)
                .is_some_and(|role| authority.outranks(role));
            if !manageable {
                return Err(DomainError::InsufficientAuthorityForRole(*role_id));
            }
        }
        Ok(())
    }

    fn into_outcome(self) -> ApplyOutcome {
        ApplyOutcome {
            added: self.added,
            removed: self.removed,
        }
    }
}

pub struct RoleApplier<'a> {
    guilds: &'a dyn GuildRepository,
    rules: &'a dyn RoleRuleRepository,
    store: &'a dyn RoleStateStore,
    platform: &'a dyn MembershipPlatform,
}

impl<'a> RoleApplier<'a> {
    pub fn new(
        guilds: &'a dyn GuildRepository,
        rules: &'a dyn RoleRuleRepository,
        store: &'a dyn RoleStateStore,
        platform: &'a dyn MembershipPlatform,
    ) -> Self {
        Self {
            guilds,
            rules,
            store,
            platform,
        }
    }

    /// Bring one member's live roles in line with the persistent rules
    ///
    /// Authority and the mark role are checked before anything is read from
    /// the member. Once the original roles are captured, any failure triggers
    /// a restore; if the restore fails too, both errors come back in
    /// `RollbackFailed`.
    #[instrument(skip(self))]
    pub async fn apply_desired_roles(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
        reason: &str,
    ) -> Result<ApplyOutcome, DomainError> {
        let authority = self.platform.get_bot_authority(guild_id).await?;
        if !authority.has_manage_roles {
            return Err(DomainError::InsufficientAuthority);
        }

        let guild = self.guilds.get_or_create(guild_id).await?;
        let roles: HashMap<Snowflake, LiveRole> = self
            .platform
            .list_roles(guild_id)
            .await?
            .into_iter()
            .map(|role| (role.id, role))
            .collect();
        let mark = guild
            .mark_role_id
            .and_then(|id| roles.get(&id))
            .ok_or(DomainError::MarkRoleMissing)?;
        if !authority.outranks(mark) {
            return Err(DomainError::InsufficientAuthority);
        }
        let mark_role_id = mark.id;

        let original = self
            .platform
            .get_member_live_roles(guild_id, member_id)
            .await?;

        let result = self
            .replace(guild_id, member_id, &original, &roles, &authority, mark_role_id, reason)
            .await;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                warn!(%guild_id, %member_id, error = %err, "Role update failed, restoring original roles");
                match self
                    .platform
                    .replace_member_roles(guild_id, member_id, &original, ROLLBACK_REASON)
                    .await
                {
                    Ok(()) => Err(err),
                    Err(rollback) => Err(DomainError::rollback_failed(err, rollback)),
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn replace(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
        original: &BTreeSet<Snowflake>,
        roles: &HashMap<Snowflake, LiveRole>,
        authority: &BotAuthority,
        mark_role_id: Snowflake,
        reason: &str,
    ) -> Result<ApplyOutcome, DomainError> {
        // Rules whose role was deleted on the platform are ignored
        let rules: Vec<PersistentRoleRule> = self
            .rules
            .find_by_guild(guild_id)
            .await?
            .into_iter()
            .filter(|rule| roles.contains_key(&rule.role_id))
            .collect();
        let role_ids: Vec<Snowflake> = rules.iter().map(|rule| rule.role_id).collect();
        let stored = self.store.get_flags(guild_id, member_id, &role_ids).await?;

        let plan = plan_roles(original, &effective_flags(&rules, &stored), mark_role_id);
        plan.check_authority(authority, roles, mark_role_id)?;

        if plan.added.is_empty() && plan.removed.is_empty() {
            debug!(%guild_id, %member_id, "Roles already up to date");
            return Ok(plan.into_outcome());
        }

        self.platform
            .replace_member_roles(guild_id, member_id, &plan.desired, reason)
            .await?;

        info!(
            %guild_id,
            %member_id,
            added = plan.added.len(),
            removed = plan.removed.len(),
            "Member roles updated"
        );
        Ok(plan.into_outcome())
    }
}
