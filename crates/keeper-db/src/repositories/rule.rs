//! PostgreSQL implementation of RoleRuleRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use keeper_core::entities::PersistentRoleRule;
use keeper_core::traits::{RepoResult, RoleRuleRepository};
use keeper_core::value_objects::Snowflake;

use crate::models::RoleRuleModel;

use super::error::map_db_error;

/// PostgreSQL implementation of RoleRuleRepository
#[derive(Clone)]
pub struct PgRoleRuleRepository {
    pool: PgPool,
}

impl PgRoleRuleRepository {
    /// Create a new PgRoleRuleRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRuleRepository for PgRoleRuleRepository {
    #[instrument(skip(self))]
    async fn upsert(&self, rule: &PersistentRoleRule) -> RepoResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query("INSERT INTO guilds (guild_id) VALUES ($1) ON CONFLICT (guild_id) DO NOTHING")
            .bind(rule.guild_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO guild_roles (guild_id, role_id, default_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id, role_id)
            DO UPDATE SET default_value = EXCLUDED.default_value
            "#,
        )
        .bind(rule.guild_id.into_inner())
        .bind(rule.role_id.into_inner())
        .bind(rule.default_value)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, guild_id: Snowflake, role_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM guild_roles WHERE guild_id = $1 AND role_id = $2")
            .bind(guild_id.into_inner())
            .bind(role_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<PersistentRoleRule>> {
        let models = sqlx::query_as::<_, RoleRuleModel>(
            r#"
            SELECT guild_id, role_id, default_value
            FROM guild_roles
            WHERE guild_id = $1
            ORDER BY role_id
            "#,
        )
        .bind(guild_id.into_inner())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(models.into_iter().map(PersistentRoleRule::from).collect())
    }
}
