//! Startup errors

use keeper_service::ServiceError;

/// Failures that stop the bot from starting
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service setup error: {0}")]
    Service(#[from] ServiceError),
}
