//! # keeper-db
//!
//! Database layer implementing the persistence ports with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! - Connection pool management and schema migrations
//! - Database models with SQLx `FromRow` derives
//! - Model → entity mappers
//! - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keeper_common::DatabaseConfig;
//! use keeper_db::{create_pool, run_migrations, PgRoleStateStore};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::new("postgres://localhost/keeper")).await?;
//!     run_migrations(&pool).await?;
//!     let store = PgRoleStateStore::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, PgPool};
pub use repositories::{PgGuildRepository, PgRoleRuleRepository, PgRoleStateStore};
