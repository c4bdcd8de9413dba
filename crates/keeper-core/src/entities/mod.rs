//! Domain entities - core business objects

mod audit;
mod guild;
mod live;
mod member;
mod rule;

pub use audit::{AuditEntry, AuditLogKind, RoleChange, RoleChangeKind};
pub use guild::{Guild, WelcomeMessage};
pub use live::{BotAuthority, LiveMember, LiveRole};
pub use member::{Member, MemberRoleFlag};
pub use rule::{effective_flags, PersistentRoleRule};
