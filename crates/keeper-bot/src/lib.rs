//! # keeper-bot
//!
//! Process wiring: PostgreSQL adapters, the Discord REST client and the
//! periodic sweep scheduler.

pub mod discord;
pub mod error;
pub mod scheduler;

use std::sync::Arc;

use keeper_common::AppConfig;
use keeper_db::{create_pool, run_migrations, PgGuildRepository, PgRoleRuleRepository, PgRoleStateStore};
use keeper_service::{ServiceContext, ServiceContextBuilder};
use tracing::{error, info};

pub use discord::DiscordClient;
pub use error::BotError;
pub use scheduler::{RunSummary, SweepScheduler};

/// Connect to storage and the platform and build the service context
pub async fn create_service_context(config: &AppConfig) -> Result<ServiceContext, BotError> {
    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;
    info!("PostgreSQL connection established");

    let platform = DiscordClient::new(&config.discord)?;

    let ctx = ServiceContextBuilder::new()
        .guild_repo(Arc::new(PgGuildRepository::new(pool.clone())))
        .rule_repo(Arc::new(PgRoleRuleRepository::new(pool.clone())))
        .state_store(Arc::new(PgRoleStateStore::new(pool)))
        .platform(Arc::new(platform))
        .sweep_config(config.sweep.clone())
        .build()?;
    Ok(ctx)
}

/// Run the bot until ctrl-c
pub async fn run(config: AppConfig) -> Result<(), BotError> {
    let ctx = create_service_context(&config).await?;
    SweepScheduler::new(ctx, &config.sweep)
        .run_until(shutdown_signal())
        .await;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Could not listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
