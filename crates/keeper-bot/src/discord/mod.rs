//! Discord REST implementation of the membership platform port

mod client;
mod models;

pub use client::DiscordClient;
pub use models::{
    AuditLogChangePayload, AuditLogEntryPayload, AuditLogPage, MemberPayload, PartialRolePayload,
    RateLimitPayload, RolePayload, UserPayload,
};
