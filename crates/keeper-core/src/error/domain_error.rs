//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Guild not found: {0}")]
    GuildNotFound(Snowflake),

    #[error("Member not found: {0}")]
    MemberNotFound(Snowflake),

    #[error("Role not found: {0}")]
    RoleNotFound(Snowflake),

    #[error("Role is not a persistent role: {0}")]
    NotPersistentRole(Snowflake),

    // =========================================================================
    // Authority Errors
    // =========================================================================
    #[error("Bot lacks permission to manage roles")]
    InsufficientAuthority,

    #[error("Bot cannot manage role {0}")]
    InsufficientAuthorityForRole(Snowflake),

    #[error("Role cannot be managed: {0}")]
    CannotManageRole(Snowflake),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Mark role is not configured or was deleted")]
    MarkRoleMissing,

    #[error("Mark role is already set to {0}")]
    MarkRoleAlreadySet(Snowflake),

    // =========================================================================
    // Composite Errors
    // =========================================================================
    #[error("{source}; restoring the previous roles also failed: {rollback}")]
    RollbackFailed {
        source: Box<DomainError>,
        rollback: Box<DomainError>,
    },

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Platform rate limit exceeded")]
    RateLimited,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl DomainError {
    /// Combine an operation failure with the failure of its rollback
    pub fn rollback_failed(source: DomainError, rollback: DomainError) -> Self {
        Self::RollbackFailed {
            source: Box::new(source),
            rollback: Box::new(rollback),
        }
    }

    /// Get an error code string for callers that render errors
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::GuildNotFound(_) => "UNKNOWN_GUILD",
            Self::MemberNotFound(_) => "UNKNOWN_MEMBER",
            Self::RoleNotFound(_) => "UNKNOWN_ROLE",
            Self::NotPersistentRole(_) => "NOT_PERSISTENT_ROLE",

            // Authority
            Self::InsufficientAuthority => "INSUFFICIENT_AUTHORITY",
            Self::InsufficientAuthorityForRole(_) => "INSUFFICIENT_AUTHORITY_FOR_ROLE",
            Self::CannotManageRole(_) => "CANNOT_MANAGE_ROLE",

            // Configuration
            Self::MarkRoleMissing => "MARK_ROLE_MISSING",
            Self::MarkRoleAlreadySet(_) => "MARK_ROLE_ALREADY_SET",

            // Composite
            Self::RollbackFailed { .. } => "ROLLBACK_FAILED",

            // Infrastructure
            Self::Platform(_) => "PLATFORM_ERROR",
            Self::RateLimited => "RATE_LIMITED",
            Self::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GuildNotFound(_)
                | Self::MemberNotFound(_)
                | Self::RoleNotFound(_)
                | Self::NotPersistentRole(_)
        )
    }

    /// Check if this is an authority error
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::InsufficientAuthority
                | Self::InsufficientAuthorityForRole(_)
                | Self::CannotManageRole(_)
        )
    }

    /// Check if this needs operator reconfiguration
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MarkRoleMissing | Self::MarkRoleAlreadySet(_))
    }

    /// Check if retrying the same call later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Platform(_) | Self::RateLimited | Self::DatabaseError(_)
        )
    }
}
