//! Periodic sweep scheduler
//!
//! Runs an ALL sweep of every configured guild on a fixed interval until the
//! shutdown future resolves.

use std::future::Future;
use std::time::Duration;

use keeper_common::SweepConfig;
use keeper_service::{ServiceContext, SweepOutcome, SweepService};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

/// Totals of one scheduled run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub busy: usize,
    pub failed: usize,
}

pub struct SweepScheduler {
    ctx: ServiceContext,
    period: Duration,
    on_startup: bool,
}

impl SweepScheduler {
    pub fn new(ctx: ServiceContext, config: &SweepConfig) -> Self {
        Self {
            ctx,
            period: config.interval().max(Duration::from_secs(1)),
            on_startup: config.on_startup,
        }
    }

    /// Sweep every configured guild once
    pub async fn run_once(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        let results = match SweepService::new(&self.ctx).refresh_all_guilds().await {
            Ok(results) => results,
            Err(e) => {
                error!(error = %e, "Could not list guilds to sweep");
                summary.failed += 1;
                return summary;
            }
        };

        for (_, result) in results {
            match result {
                Ok(SweepOutcome::Completed(_)) => summary.completed += 1,
                Ok(SweepOutcome::Busy) => summary.busy += 1,
                Err(_) => summary.failed += 1,
            }
        }
        summary
    }

    /// Run until `shutdown` resolves
    ///
    /// A run already in progress finishes before the scheduler stops.
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let start = if self.on_startup {
            Instant::now()
        } else {
            Instant::now() + self.period
        };
        let mut ticker = interval_at(start, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(period_secs = self.period.as_secs(), "Sweep scheduler started");
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    let summary = self.run_once().await;
                    info!(
                        completed = summary.completed,
                        busy = summary.busy,
                        failed = summary.failed,
                        "Scheduled sweep finished"
                    );
                }
            }
        }
        info!("Sweep scheduler stopped");
    }
}
