//! Audit trail paginator
//!
//! Turns the platform's paged, newest-first audit feed into one list ordered
//! oldest → newest.

use keeper_core::entities::{AuditEntry, AuditLogKind};
use keeper_core::traits::{AuditDirection, AuditLogQuery, MembershipPlatform, PlatformResult};
use keeper_core::value_objects::Snowflake;
use tracing::{debug, instrument, warn};

/// Reads every audit entry on one side of a cursor
pub struct AuditPaginator<'a> {
    platform: &'a dyn MembershipPlatform,
}

impl<'a> AuditPaginator<'a> {
    pub fn new(platform: &'a dyn MembershipPlatform) -> Self {
        Self { platform }
    }

    /// Fetch all entries of `kind` strictly after (or before) `cursor`
    ///
    /// `cursor = None` reads the whole trail from the newest entry back.
    /// Pages are requested until the platform returns an empty one. Errors
    /// from the platform are returned as-is and nothing is retried.
    #[instrument(skip(self))]
    pub async fn fetch(
        &self,
        guild_id: Snowflake,
        kind: AuditLogKind,
        cursor: Option<Snowflake>,
        direction: AuditDirection,
    ) -> PlatformResult<Vec<AuditEntry>> {
        let mut query = AuditLogQuery::new(kind, direction, cursor);
        let mut entries: Vec<AuditEntry> = Vec::new();
        let mut pages = 0usize;

        loop {
            let page = self.platform.fetch_audit_entries(guild_id, &query).await?;
            let Some(next) = next_cursor(&page, direction) else {
                break;
            };
            pages += 1;
            entries.extend(page);

            if !moves_forward(query.cursor, next, direction) {
                warn!(%guild_id, cursor = %next, "Audit page did not move the cursor, stopping");
                break;
            }
            query = query.with_cursor(next);
        }

        entries.sort_by_key(|entry| entry.id);
        debug!(%guild_id, pages, entries = entries.len(), "Audit trail read");
        Ok(entries)
    }
}

/// Cursor for the page after `page`, `None` for an empty page
fn next_cursor(page: &[AuditEntry], direction: AuditDirection) -> Option<Snowflake> {
    let ids = page.iter().map(|entry| entry.id);
    match direction {
        AuditDirection::After => ids.max(),
        AuditDirection::Before => ids.min(),
    }
}

fn moves_forward(current: Option<Snowflake>, next: Snowflake, direction: AuditDirection) -> bool {
    match (current, direction) {
        (None, _) => true,
        (Some(current), AuditDirection::After) => next > current,
        (Some(current), AuditDirection::Before) => next < current,
    }
}
