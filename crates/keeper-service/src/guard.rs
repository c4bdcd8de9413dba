//! Per-guild sweep guard
//!
//! At most one full-guild sweep runs per guild at a time. A second attempt is
//! rejected immediately instead of queueing.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use keeper_core::value_objects::Snowflake;
use tracing::debug;

/// Marker stored while a guild is being swept
#[derive(Debug, Clone, Copy)]
pub struct SweepToken {
    started_at: Instant,
}

impl SweepToken {
    fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Process-wide map of guilds currently being swept
#[derive(Debug, Default)]
pub struct SweepGuard {
    active: DashMap<Snowflake, SweepToken>,
}

impl SweepGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `guild_id` as sweeping; `false` if a sweep already holds it
    pub fn begin_sweep(&self, guild_id: Snowflake) -> bool {
        match self.active.entry(guild_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(SweepToken::new());
                true
            }
        }
    }

    /// Release `guild_id`
    pub fn end_sweep(&self, guild_id: Snowflake) {
        if let Some((_, token)) = self.active.remove(&guild_id) {
            debug!(%guild_id, elapsed_ms = token.elapsed().as_millis(), "Sweep released");
        }
    }

    pub fn is_sweeping(&self, guild_id: Snowflake) -> bool {
        self.active.contains_key(&guild_id)
    }

    /// Like [`begin_sweep`](Self::begin_sweep), returning a permit that
    /// releases the guild when dropped
    pub fn try_acquire(&self, guild_id: Snowflake) -> Option<SweepPermit<'_>> {
        self.begin_sweep(guild_id).then_some(SweepPermit {
            guard: self,
            guild_id,
        })
    }
}

/// Held for the duration of a sweep
///
/// Dropping it releases the guild on every exit path, including errors and
/// cancellation of the owning future.
#[derive(Debug)]
pub struct SweepPermit<'a> {
    guard: &'a SweepGuard,
    guild_id: Snowflake,
}

impl SweepPermit<'_> {
    pub fn guild_id(&self) -> Snowflake {
        self.guild_id
    }
}

impl Drop for SweepPermit<'_> {
    fn drop(&mut self) {
        self.guard.end_sweep(self.guild_id);
    }
}
