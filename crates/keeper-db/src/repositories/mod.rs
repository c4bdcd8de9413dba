//! Repository implementations
//!
//! PostgreSQL implementations of the persistence ports defined in keeper-core.

mod error;
mod guild;
mod rule;
mod state;

pub use guild::PgGuildRepository;
pub use rule::PgRoleRuleRepository;
pub use state::PgRoleStateStore;
