//! PostgreSQL implementation of GuildRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use keeper_core::entities::{Guild, WelcomeMessage};
use keeper_core::traits::{GuildRepository, RepoResult};
use keeper_core::value_objects::Snowflake;

use crate::models::GuildModel;

use super::error::map_db_error;

const GUILD_COLUMNS: &str = "guild_id, mark_role_id, last_audit_cursor, welcome_msg, \
                             welcome_channel_id, created_at, updated_at";

/// PostgreSQL implementation of GuildRepository
#[derive(Clone)]
pub struct PgGuildRepository {
    pool: PgPool,
}

impl PgGuildRepository {
    /// Create a new PgGuildRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuildRepository for PgGuildRepository {
    #[instrument(skip(self))]
    async fn get_or_create(&self, id: Snowflake) -> RepoResult<Guild> {
        let sql = format!(
            r#"
            INSERT INTO guilds (guild_id)
            VALUES ($1)
            ON CONFLICT (guild_id) DO UPDATE SET guild_id = EXCLUDED.guild_id
            RETURNING {GUILD_COLUMNS}
            "#
        );

        let model = sqlx::query_as::<_, GuildModel>(&sql)
            .bind(id.into_inner())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(model.into())
    }

    #[instrument(skip(self))]
    async fn find_initialized(&self) -> RepoResult<Vec<Guild>> {
        let sql = format!(
            r#"
            SELECT {GUILD_COLUMNS}
            FROM guilds
            WHERE mark_role_id IS NOT NULL
            ORDER BY guild_id
            "#
        );

        let models = sqlx::query_as::<_, GuildModel>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(models.into_iter().map(Guild::from).collect())
    }

    #[instrument(skip(self))]
    async fn set_mark_role(&self, id: Snowflake, role_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO guilds (guild_id, mark_role_id)
            VALUES ($1, $2)
            ON CONFLICT (guild_id)
            DO UPDATE SET mark_role_id = EXCLUDED.mark_role_id, updated_at = NOW()
            WHERE guilds.mark_role_id IS NULL
               OR guilds.mark_role_id = EXCLUDED.mark_role_id
            "#,
        )
        .bind(id.into_inner())
        .bind(role_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self, welcome))]
    async fn set_welcome(&self, id: Snowflake, welcome: Option<&WelcomeMessage>) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO guilds (guild_id, welcome_msg, welcome_channel_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id)
            DO UPDATE SET
                welcome_msg = EXCLUDED.welcome_msg,
                welcome_channel_id = EXCLUDED.welcome_channel_id,
                updated_at = NOW()
            "#,
        )
        .bind(id.into_inner())
        .bind(welcome.map(|w| w.message.as_str()))
        .bind(welcome.map(|w| w.channel_id.into_inner()))
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }
}
