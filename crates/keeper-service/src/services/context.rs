//! Service context - dependency container for services
//!
//! Holds the persistence ports, the platform client, the sweep guard and the
//! sweep settings.

use std::sync::Arc;

use keeper_common::SweepConfig;
use keeper_core::traits::{GuildRepository, MembershipPlatform, RoleRuleRepository, RoleStateStore};

use crate::applier::RoleApplier;
use crate::audit::AuditPaginator;
use crate::guard::SweepGuard;
use crate::projector::EventProjector;
use crate::snapshot::SnapshotReconciler;

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// Cheap to clone; every clone shares the same guard, so sweeps started from
/// any clone exclude each other.
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    guild_repo: Arc<dyn GuildRepository>,
    rule_repo: Arc<dyn RoleRuleRepository>,
    state_store: Arc<dyn RoleStateStore>,

    // Platform
    platform: Arc<dyn MembershipPlatform>,

    // Shared state
    guard: Arc<SweepGuard>,
    sweep: SweepConfig,
}

impl ServiceContext {
    /// Create a new service context with a fresh sweep guard
    pub fn new(
        guild_repo: Arc<dyn GuildRepository>,
        rule_repo: Arc<dyn RoleRuleRepository>,
        state_store: Arc<dyn RoleStateStore>,
        platform: Arc<dyn MembershipPlatform>,
        sweep: SweepConfig,
    ) -> Self {
        Self {
            guild_repo,
            rule_repo,
            state_store,
            platform,
            guard: Arc::new(SweepGuard::new()),
            sweep,
        }
    }

    // === Repositories ===

    /// Get the guild repository
    pub fn guild_repo(&self) -> &dyn GuildRepository {
        self.guild_repo.as_ref()
    }

    /// Get the persistent role rule repository
    pub fn rule_repo(&self) -> &dyn RoleRuleRepository {
        self.rule_repo.as_ref()
    }

    /// Get the role state store
    pub fn state_store(&self) -> &dyn RoleStateStore {
        self.state_store.as_ref()
    }

    // === Platform ===

    pub fn platform(&self) -> &dyn MembershipPlatform {
        self.platform.as_ref()
    }

    // === Shared state ===

    pub fn guard(&self) -> &SweepGuard {
        self.guard.as_ref()
    }

    pub fn sweep_config(&self) -> &SweepConfig {
        &self.sweep
    }

    // === Engine ===

    pub fn paginator(&self) -> AuditPaginator<'_> {
        AuditPaginator::new(self.platform())
    }

    pub fn projector(&self) -> EventProjector<'_> {
        EventProjector::new(self.state_store())
    }

    pub fn snapshot(&self) -> SnapshotReconciler<'_> {
        SnapshotReconciler::new(self.state_store())
    }

    pub fn applier(&self) -> RoleApplier<'_> {
        RoleApplier::new(
            self.guild_repo(),
            self.rule_repo(),
            self.state_store(),
            self.platform(),
        )
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("platform", &"...")
            .field("guard", &self.guard)
            .field("sweep", &self.sweep)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    guild_repo: Option<Arc<dyn GuildRepository>>,
    rule_repo: Option<Arc<dyn RoleRuleRepository>>,
    state_store: Option<Arc<dyn RoleStateStore>>,
    platform: Option<Arc<dyn MembershipPlatform>>,
    sweep: Option<SweepConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn guild_repo(mut self, repo: Arc<dyn GuildRepository>) -> Self {
        self.guild_repo = Some(repo);
        self
    }

    pub fn rule_repo(mut self, repo: Arc<dyn RoleRuleRepository>) -> Self {
        self.rule_repo = Some(repo);
        self
    }

    pub fn state_store(mut self, store: Arc<dyn RoleStateStore>) -> Self {
        self.state_store = Some(store);
        self
    }

    pub fn platform(mut self, platform: Arc<dyn MembershipPlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn sweep_config(mut self, sweep: SweepConfig) -> Self {
        self.sweep = Some(sweep);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.guild_repo
                .ok_or_else(|| ServiceError::validation("guild_repo is required"))?,
            self.rule_repo
                .ok_or_else(|| ServiceError::validation("rule_repo is required"))?,
            self.state_store
                .ok_or_else(|| ServiceError::validation("state_store is required"))?,
            self.platform
                .ok_or_else(|| ServiceError::validation("platform is required"))?,
            self.sweep.unwrap_or_default(),
        ))
    }
}
