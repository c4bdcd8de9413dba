//! Event projector
//!
//! Folds audit entries into per-member role flags (last write wins) and
//! advances the read cursors.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use keeper_core::entities::AuditEntry;
use keeper_core::traits::{RepoResult, RoleStateStore};
use keeper_core::value_objects::Snowflake;
use tracing::{debug, instrument};

/// Which cursors a projection advances
#[derive(Debug, Clone, Copy)]
pub enum CursorScope<'a> {
    /// Single-member read: only entries targeting this member are folded
    Member(Snowflake),
    /// Guild-wide read: every entry is folded and each listed live member's
    /// cursor moves too, even when the batch never mentions them
    Guild { members: &'a [Snowflake] },
}

/// Result of folding a batch without touching storage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleFold {
    /// Per-member flags, one value per role
    pub pending: BTreeMap<Snowflake, HashMap<Snowflake, bool>>,
    /// Largest entry ID seen, including entries that were skipped
    pub newest: Option<Snowflake>,
}

/// Fold `entries` (oldest → newest) into pending flags
///
/// Within an entry, changes and their roles apply in the order given, so a
/// role added and removed in the same entry ends up with the later value.
pub fn fold_entries(entries: &[AuditEntry], only: Option<Snowflake>) -> RoleFold {
    let mut fold = RoleFold::default();

    for entry in entries {
        fold.newest = Snowflake::newest(fold.newest, Some(entry.id));

        let Some(target) = entry.target_id else {
            continue;
        };
        if only.is_some_and(|member| member != target) {
            continue;
        }

        let flags = fold.pending.entry(target).or_default();
        for change in &entry.changes {
            for role_id in &change.roles {
                flags.insert(*role_id, change.kind.as_flag());
            }
        }
    }

    fold
}

/// What a projection wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Projection {
    /// Cursor value written, `None` for an empty batch
    pub newest: Option<Snowflake>,
    /// Members whose flags were written
    pub members: usize,
    /// Flags written in total
    pub flags: usize,
}

impl Projection {
    fn from_fold(fold: &RoleFold) -> Self {
        Self {
            newest: fold.newest,
            members: fold.pending.len(),
            flags: fold.pending.values().map(HashMap::len).sum(),
        }
    }
}

pub struct EventProjector<'a> {
    store: &'a dyn RoleStateStore,
}

impl<'a> EventProjector<'a> {
    pub fn new(store: &'a dyn RoleStateStore) -> Self {
        Self { store }
    }

    /// Persist the fold of `entries` and advance cursors to its newest ID
    ///
    /// Flags are written first, one atomic write per member; cursors only move
    /// once every flag write succeeded. An empty batch writes nothing.
    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub async fn project(
        &self,
        guild_id: Snowflake,
        entries: &[AuditEntry],
        scope: CursorScope<'_>,
    ) -> RepoResult<Projection> {
        let only = match scope {
            CursorScope::Member(member_id) => Some(member_id),
            CursorScope::Guild { .. } => None,
        };
        let fold = fold_entries(entries, only);
        let Some(newest) = fold.newest else {
            return Ok(Projection::default());
        };

        for (member_id, flags) in &fold.pending {
            self.store.set_flags(guild_id, *member_id, flags).await?;
        }
        let projection = Projection::from_fold(&fold);

        self.advance_cursors(guild_id, &fold, newest, scope).await?;

        debug!(%guild_id, cursor = %newest, members = projection.members, "Audit entries projected");
        Ok(projection)
    }

    /// Rebuild every flag of the guild from `entries` (the whole trail)
    ///
    /// The wipe and the replayed flags commit together, so a failure keeps
    /// the previous flags and cursors. Returns the projection and the number
    /// of flags the wipe removed.
    #[instrument(skip(self, entries, members), fields(entries = entries.len()))]
    pub async fn replace(
        &self,
        guild_id: Snowflake,
        entries: &[AuditEntry],
        members: &[Snowflake],
    ) -> RepoResult<(Projection, u64)> {
        let fold = fold_entries(entries, None);
        let cleared = self.store.replace_all_flags(guild_id, &fold.pending).await?;

        let projection = Projection::from_fold(&fold);
        if let Some(newest) = fold.newest {
            self.advance_cursors(guild_id, &fold, newest, CursorScope::Guild { members })
                .await?;
        }

        debug!(%guild_id, cleared, members = projection.members, "Role flags rebuilt");
        Ok((projection, cleared))
    }

    async fn advance_cursors(
        &self,
        guild_id: Snowflake,
        fold: &RoleFold,
        newest: Snowflake,
        scope: CursorScope<'_>,
    ) -> RepoResult<()> {
        match scope {
            CursorScope::Member(member_id) => {
                self.store.set_cursor(guild_id, member_id, newest).await?;
            }
            CursorScope::Guild { members } => {
                let mut cursors: BTreeSet<Snowflake> = fold.pending.keys().copied().collect();
                cursors.extend(members.iter().copied());
                for member_id in cursors {
                    self.store.set_cursor(guild_id, member_id, newest).await?;
                }
            }
        }
        Ok(())
    }
}
