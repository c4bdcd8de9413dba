//! PostgreSQL implementation of RoleStateStore
//!
//! Cursor columns only ever move forward: every write goes through
//! `GREATEST(COALESCE(cursor, 0), $new)`.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use keeper_core::entities::Member;
use keeper_core::traits::{RepoResult, RoleStateStore};
use keeper_core::value_objects::Snowflake;

use crate::mappers::flags_from_rows;
use crate::models::{MemberModel, MemberRoleFlagModel};

use super::error::map_db_error;

/// PostgreSQL implementation of RoleStateStore
#[derive(Clone)]
pub struct PgRoleStateStore {
    pool: PgPool,
}

impl PgRoleStateStore {
    /// Create a new PgRoleStateStore
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStateStore for PgRoleStateStore {
    #[instrument(skip(self))]
    async fn get_member(&self, guild_id: Snowflake, member_id: Snowflake) -> RepoResult<Member> {
        let model = sqlx::query_as::<_, MemberModel>(
            r#"
            INSERT INTO members (guild_id, member_id)
            VALUES ($1, $2)
            ON CONFLICT (guild_id, member_id) DO UPDATE SET member_id = EXCLUDED.member_id
            RETURNING guild_id, member_id, role_updated_at
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(member_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(model.into())
    }

    async fn get_cursor(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
    ) -> RepoResult<Option<Snowflake>> {
        Ok(self.get_member(guild_id, member_id).await?.role_updated_at)
    }

    #[instrument(skip(self))]
    async fn set_cursor(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
        audit_id: Snowflake,
    ) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO members (guild_id, member_id, role_updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (guild_id, member_id)
            DO UPDATE SET role_updated_at =
                GREATEST(COALESCE(members.role_updated_at, 0), EXCLUDED.role_updated_at)
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(member_id.into_inner())
        .bind(audit_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_guild_cursor(&self, guild_id: Snowflake) -> RepoResult<Option<Snowflake>> {
        let cursor = sqlx::query_scalar::<_, Option<i64>>(
            "SELECT last_audit_cursor FROM guilds WHERE guild_id = $1",
        )
        .bind(guild_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(cursor.flatten().map(Snowflake::new))
    }

    #[instrument(skip(self))]
    async fn set_guild_cursor(&self, guild_id: Snowflake, audit_id: Snowflake) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO guilds (guild_id, last_audit_cursor)
            VALUES ($1, $2)
            ON CONFLICT (guild_id)
            DO UPDATE SET
                last_audit_cursor =
                    GREATEST(COALESCE(guilds.last_audit_cursor, 0), EXCLUDED.last_audit_cursor),
                updated_at = NOW()
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(audit_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self, role_ids), fields(roles = role_ids.len()))]
    async fn get_flags(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
        role_ids: &[Snowflake],
    ) -> RepoResult<HashMap<Snowflake, bool>> {
        if role_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<i64> = role_ids.iter().map(|id| id.into_inner()).collect();

        let rows = sqlx::query_as::<_, MemberRoleFlagModel>(
            r#"
            SELECT role_id, flag
            FROM member_roles
            WHERE guild_id = $1 AND member_id = $2 AND role_id = ANY($3)
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(member_id.into_inner())
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(flags_from_rows(rows))
    }

    #[instrument(skip(self, flags), fields(flags = flags.len()))]
    async fn set_flags(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
        flags: &HashMap<Snowflake, bool>,
    ) -> RepoResult<()> {
        if flags.is_empty() {
            return Ok(());
        }

        let (role_ids, values): (Vec<i64>, Vec<bool>) = flags
            .iter()
            .map(|(role_id, flag)| (role_id.into_inner(), *flag))
            .unzip();

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO members (guild_id, member_id)
            VALUES ($1, $2)
            ON CONFLICT (guild_id, member_id) DO NOTHING
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(member_id.into_inner())
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO member_roles (guild_id, member_id, role_id, flag)
            SELECT $1, $2, t.role_id, t.flag
            FROM UNNEST($3::BIGINT[], $4::BOOLEAN[]) AS t(role_id, flag)
            ON CONFLICT (guild_id, member_id, role_id)
            DO UPDATE SET flag = EXCLUDED.flag, updated_at = NOW()
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(member_id.into_inner())
        .bind(role_ids)
        .bind(values)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_all_flags(&self, guild_id: Snowflake) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM member_roles WHERE guild_id = $1")
            .bind(guild_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        debug!(rows = result.rows_affected(), "Cleared stored role flags");
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, flags), fields(members = flags.len()))]
    async fn replace_all_flags(
        &self,
        guild_id: Snowflake,
        flags: &BTreeMap<Snowflake, HashMap<Snowflake, bool>>,
    ) -> RepoResult<u64> {
        let mut member_ids = Vec::new();
        let mut role_ids = Vec::new();
        let mut values = Vec::new();
        for (member_id, member_flags) in flags {
            for (role_id, flag) in member_flags {
                member_ids.push(member_id.into_inner());
                role_ids.push(role_id.into_inner());
                values.push(*flag);
            }
        }
        let members: Vec<i64> = flags.keys().map(|id| id.into_inner()).collect();

        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let cleared = sqlx::query("DELETE FROM member_roles WHERE guild_id = $1")
            .bind(guild_id.into_inner())
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?
            .rows_affected();

        sqlx::query(
            r#"
            INSERT INTO members (guild_id, member_id)
            SELECT $1, t.member_id
            FROM UNNEST($2::BIGINT[]) AS t(member_id)
            ON CONFLICT (guild_id, member_id) DO NOTHING
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(members)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query(
            r#"
            INSERT INTO member_roles (guild_id, member_id, role_id, flag)
            SELECT $1, t.member_id, t.role_id, t.flag
            FROM UNNEST($2::BIGINT[], $3::BIGINT[], $4::BOOLEAN[]) AS t(member_id, role_id, flag)
            "#,
        )
        .bind(guild_id.into_inner())
        .bind(member_ids)
        .bind(role_ids)
        .bind(values)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        debug!(cleared, "Replaced stored role flags");
        Ok(cleared)
    }
}
