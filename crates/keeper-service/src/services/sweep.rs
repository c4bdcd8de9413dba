//! Sweep service
//!
//! Reads the audit trail, projects it into stored flags, reconciles against
//! the live member list and optionally reapplies roles.
//!
//! Three kinds of read exist:
//! - DEFAULT ([`SweepService::refresh_member`]): one member, after that
//!   member's own cursor, no snapshot, not guarded.
//! - ALL ([`SweepKind::All`]): every member, after the guild cursor.
//! - CLEAN ([`SweepKind::Clean`]): wipe every flag of the guild and replay the
//!   whole retained trail.

use futures::stream::{self, StreamExt};
use keeper_core::entities::{AuditLogKind, LiveMember};
use keeper_core::error::DomainError;
use keeper_core::traits::AuditDirection;
use keeper_core::value_objects::Snowflake;
use tracing::{debug, error, info, instrument, warn};

use crate::applier::ApplyOutcome;
use crate::projector::{CursorScope, Projection};
use crate::snapshot::SnapshotReport;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Guild-wide sweep kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepKind {
    /// Continue from the guild cursor
    All,
    /// Discard stored flags and rebuild them from the whole trail
    Clean,
}

/// Role application result for one member of a fan-out
#[derive(Debug)]
pub struct MemberApplyResult {
    pub member_id: Snowflake,
    pub result: Result<ApplyOutcome, DomainError>,
}

/// What a completed sweep did
#[derive(Debug)]
pub struct SweepReport {
    pub guild_id: Snowflake,
    pub kind: SweepKind,
    /// Audit entries read
    pub entries: usize,
    /// Flags removed by a CLEAN wipe
    pub flags_cleared: u64,
    pub projection: Projection,
    pub snapshot: SnapshotReport,
    /// Per-member results, empty when roles were not applied
    pub applied: Vec<MemberApplyResult>,
}

impl SweepReport {
    /// Members whose role application failed
    pub fn failures(&self) -> impl Iterator<Item = &MemberApplyResult> {
        self.applied.iter().filter(|r| r.result.is_err())
    }

    /// Members whose live roles were changed
    pub fn changed(&self) -> usize {
        self.applied
            .iter()
            .filter(|r| r.result.as_ref().is_ok_and(|outcome| !outcome.is_noop()))
            .count()
    }
}

/// Outcome of a guarded sweep attempt
#[derive(Debug)]
pub enum SweepOutcome {
    /// Another sweep of the same guild was running; nothing was read
    Busy,
    Completed(SweepReport),
}

impl SweepOutcome {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }

    pub fn report(&self) -> Option<&SweepReport> {
        match self {
            Self::Busy => None,
            Self::Completed(report) => Some(report),
        }
    }
}

/// Sweep service
pub struct SweepService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SweepService<'a> {
    /// Create a new SweepService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Run an ALL or CLEAN sweep of one guild
    ///
    /// Returns [`SweepOutcome::Busy`] without touching the trail when the
    /// guild is already being swept. With `apply = Some(reason)` every live
    /// member's roles are reapplied afterwards; failures are collected per
    /// member rather than aborting the sweep.
    #[instrument(skip(self))]
    pub async fn refresh_members(
        &self,
        guild_id: Snowflake,
        kind: SweepKind,
        apply: Option<&str>,
    ) -> ServiceResult<SweepOutcome> {
        let Some(_permit) = self.ctx.guard().try_acquire(guild_id) else {
            info!(%guild_id, "Sweep already running, skipping");
            return Ok(SweepOutcome::Busy);
        };

        let store = self.ctx.state_store();
        // CLEAN replays the whole trail; its wipe is deferred to the store
        // write so a failed read keeps the current flags
        let (cursor, direction) = match kind {
            SweepKind::Clean => (None, AuditDirection::Before),
            SweepKind::All => match store.get_guild_cursor(guild_id).await? {
                Some(cursor) => (Some(cursor), AuditDirection::After),
                None => (None, AuditDirection::Before),
            },
        };

        let entries = self
            .ctx
            .paginator()
            .fetch(guild_id, AuditLogKind::MemberRoleUpdate, cursor, direction)
            .await?;
        let members = self.ctx.platform().list_members(guild_id).await?;
        let member_ids: Vec<Snowflake> = members.iter().map(|m| m.id).collect();

        let projector = self.ctx.projector();
        let (projection, flags_cleared) = match kind {
            SweepKind::Clean => projector.replace(guild_id, &entries, &member_ids).await?,
            SweepKind::All => {
                let scope = CursorScope::Guild {
                    members: &member_ids,
                };
                (projector.project(guild_id, &entries, scope).await?, 0)
            }
        };
        let snapshot = self.ctx.snapshot().reconcile(guild_id, &members).await?;

        if let Some(newest) = projection.newest {
            store.set_guild_cursor(guild_id, newest).await?;
        }

        let applied = match apply {
            Some(reason) => self.apply_members(guild_id, &members, reason).await,
            None => Vec::new(),
        };

        let report = SweepReport {
            guild_id,
            kind,
            entries: entries.len(),
            flags_cleared,
            projection,
            snapshot,
            applied,
        };
        info!(
            %guild_id,
            ?kind,
            entries = report.entries,
            members = members.len(),
            changed = report.changed(),
            failed = report.failures().count(),
            "Sweep completed"
        );
        Ok(SweepOutcome::Completed(report))
    }

    /// DEFAULT read for one member: fold entries after its own cursor
    #[instrument(skip(self))]
    pub async fn refresh_member(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
    ) -> ServiceResult<Projection> {
        let cursor = self.ctx.state_store().get_cursor(guild_id, member_id).await?;
        let direction = if cursor.is_some() {
            AuditDirection::After
        } else {
            AuditDirection::Before
        };

        let entries = self
            .ctx
            .paginator()
            .fetch(guild_id, AuditLogKind::MemberRoleUpdate, cursor, direction)
            .await?;

        let projection = self
            .ctx
            .projector()
            .project(guild_id, &entries, CursorScope::Member(member_id))
            .await?;
        Ok(projection)
    }

    /// ALL sweep of every guild with a mark role, without applying roles
    ///
    /// One guild failing does not stop the others.
    #[instrument(skip(self))]
    pub async fn refresh_all_guilds(&self) -> ServiceResult<Vec<(Snowflake, ServiceResult<SweepOutcome>)>> {
        let guilds = self.ctx.guild_repo().find_initialized().await?;
        let mut results = Vec::with_capacity(guilds.len());

        for guild in guilds {
            let result = self.refresh_members(guild.id, SweepKind::All, None).await;
            match &result {
                Ok(SweepOutcome::Busy) => debug!(guild_id = %guild.id, "Guild busy, left for next run"),
                Ok(SweepOutcome::Completed(_)) => {}
                Err(e) => error!(guild_id = %guild.id, error = %e, "Guild sweep failed"),
            }
            results.push((guild.id, result));
        }

        Ok(results)
    }

    /// Apply desired roles to `members` with bounded concurrency
    pub(crate) async fn apply_members(
        &self,
        guild_id: Snowflake,
        members: &[LiveMember],
        reason: &str,
    ) -> Vec<MemberApplyResult> {
        let applier = self.ctx.applier();
        let applier = &applier;
        let concurrency = self.ctx.sweep_config().apply_concurrency.max(1);

        let member_ids: Vec<Snowflake> = members.iter().map(|m| m.id).collect();
        stream::iter(member_ids)
            .map(|member_id| async move {
                let result = applier.apply_desired_roles(guild_id, member_id, reason).await;
                if let Err(e) = &result {
                    warn!(%guild_id, %member_id, error = %e, "Could not apply member roles");
                }
                MemberApplyResult { member_id, result }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await
    }
}
