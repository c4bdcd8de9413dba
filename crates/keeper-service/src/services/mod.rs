//! Operations built on the engine
//!
//! Sweeps, guild configuration and member events. Each service borrows the
//! shared [`ServiceContext`].

pub mod context;
pub mod error;
pub mod guild;
pub mod member;
pub mod sweep;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use guild::GuildService;
pub use member::MemberService;
pub use sweep::{MemberApplyResult, SweepKind, SweepOutcome, SweepReport, SweepService};
