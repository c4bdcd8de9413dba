//! Snapshot reconciler
//!
//! Covers roles granted before the audit trail's retention window: any live
//! role a member holds with no recorded flag is recorded as held. Existing
//! flags are left alone, including `false`, and a missing role never clears
//! a flag.

use std::collections::HashMap;

use keeper_core::entities::LiveMember;
use keeper_core::traits::{RepoResult, RoleStateStore};
use keeper_core::value_objects::Snowflake;
use tracing::{debug, instrument};

/// Totals of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotReport {
    pub members: usize,
    pub flags_created: usize,
}

pub struct SnapshotReconciler<'a> {
    store: &'a dyn RoleStateStore,
}

impl<'a> SnapshotReconciler<'a> {
    pub fn new(store: &'a dyn RoleStateStore) -> Self {
        Self { store }
    }

    #[instrument(skip(self, members), fields(members = members.len()))]
    pub async fn reconcile(
        &self,
        guild_id: Snowflake,
        members: &[LiveMember],
    ) -> RepoResult<SnapshotReport> {
        let mut report = SnapshotReport::default();

        for member in members {
            report.members += 1;
            if member.role_ids.is_empty() {
                continue;
            }

            let live: Vec<Snowflake> = member.role_ids.iter().copied().collect();
            let stored = self.store.get_flags(guild_id, member.id, &live).await?;

            let missing: HashMap<Snowflake, bool> = live
                .into_iter()
                .filter(|role_id| !stored.contains_key(role_id))
                .map(|role_id| (role_id, true))
                .collect();
            if missing.is_empty() {
                continue;
            }

            self.store.set_flags(guild_id, member.id, &missing).await?;
            report.flags_created += missing.len();
        }

        debug!(%guild_id, flags_created = report.flags_created, "Snapshot reconciled");
        Ok(report)
    }
}
