//! # keeper-service
//!
//! The role reconciliation engine and the operations built on it.
//!
//! Control flow for a guild sweep:
//! [`SweepGuard`] → [`AuditPaginator`] → [`EventProjector`] →
//! [`SnapshotReconciler`] → [`RoleApplier`] (per member).

pub mod applier;
pub mod audit;
pub mod guard;
pub mod projector;
pub mod services;
pub mod snapshot;

pub use applier::{plan_roles, ApplyOutcome, RoleApplier, RolePlan, ROLLBACK_REASON};
pub use audit::AuditPaginator;
pub use guard::{SweepGuard, SweepPermit};
pub use projector::{fold_entries, CursorScope, EventProjector, Projection, RoleFold};
pub use services::{
    GuildService, MemberApplyResult, MemberService, ServiceContext, ServiceContextBuilder,
    ServiceError, ServiceResult, SweepKind, SweepOutcome, SweepReport, SweepService,
};
pub use snapshot::{SnapshotReconciler, SnapshotReport};
