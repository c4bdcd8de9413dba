//! Discord REST client
//!
//! Every call is a fresh request; nothing is cached except the bot's own
//! user ID. 429 responses are retried after the advertised delay.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use keeper_common::DiscordConfig;
use keeper_core::entities::{AuditEntry, BotAuthority, LiveMember, LiveRole};
use keeper_core::error::DomainError;
use keeper_core::traits::{AuditDirection, AuditLogQuery, MembershipPlatform, PlatformResult};
use keeper_core::value_objects::{Permissions, Snowflake};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, instrument, warn};

use super::models::{AuditLogPage, MemberPayload, RateLimitPayload, RolePayload, UserPayload};

const AUDIT_REASON_HEADER: &str = "X-Audit-Log-Reason";
const MEMBER_PAGE_LIMIT: usize = 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const FALLBACK_RETRY: Duration = Duration::from_secs(1);

/// What a 404 means for a request
#[derive(Debug, Clone, Copy)]
enum Resource {
    Guild(Snowflake),
    Member(Snowflake),
    BotUser,
}

impl Resource {
    fn not_found(self) -> DomainError {
        match self {
            Self::Guild(id) => DomainError::GuildNotFound(id),
            Self::Member(id) => DomainError::MemberNotFound(id),
            Self::BotUser => DomainError::Platform("bot user not found".to_string()),
        }
    }
}

fn map_http_error(e: reqwest::Error) -> DomainError {
    DomainError::Platform(e.to_string())
}

/// Discord REST implementation of [`MembershipPlatform`]
pub struct DiscordClient {
    http: Client,
    api_base: String,
    authorization: String,
    max_retries: u32,
    bot_user_id: OnceCell<Snowflake>,
}

impl DiscordClient {
    /// Create a client for the configured API base and bot token
    pub fn new(config: &DiscordConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("DiscordBot (role-keeper, ", env!("CARGO_PKG_VERSION"), ")"))
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            authorization: format!("Bot {}", config.token),
            max_retries: config.max_retries,
            bot_user_id: OnceCell::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Send a request, retrying on rate limits, and map failures
    async fn send<F>(&self, resource: Resource, build: F) -> PlatformResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let response = build()
                .header(AUTHORIZATION, self.authorization.as_str())
                .send()
                .await
                .map_err(map_http_error)?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= self.max_retries {
                    return Err(DomainError::RateLimited);
                }
                attempt += 1;
                let wait = response
                    .json::<RateLimitPayload>()
                    .await
                    .map_or(FALLBACK_RETRY, |limit| limit.wait());
                warn!(attempt, wait_ms = wait.as_millis(), "Rate limited, retrying");
                tokio::time::sleep(wait).await;
                continue;
            }

            return match status {
                s if s.is_success() => Ok(response),
                StatusCode::NOT_FOUND => Err(resource.not_found()),
                StatusCode::FORBIDDEN => Err(DomainError::InsufficientAuthority),
                s => {
                    let body = response.text().await.unwrap_or_default();
                    Err(DomainError::Platform(format!("HTTP {s}: {body}")))
                }
            };
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, resource: Resource, path: &str) -> PlatformResult<T> {
        let url = self.url(path);
        self.send(resource, || self.http.get(&url))
            .await?
            .json::<T>()
            .await
            .map_err(map_http_error)
    }

    async fn bot_user_id(&self) -> PlatformResult<Snowflake> {
        self.bot_user_id
            .get_or_try_init(|| async {
                let user: UserPayload = self.get_json(Resource::BotUser, "/users/@me").await?;
                debug!(bot_user_id = %user.id, "Resolved bot user");
                Ok::<_, DomainError>(user.id)
            })
            .await
            .copied()
    }

    async fn get_member(&self, guild_id: Snowflake, member_id: Snowflake) -> PlatformResult<MemberPayload> {
        self.get_json(
            Resource::Member(member_id),
            &format!("/guilds/{guild_id}/members/{member_id}"),
        )
        .await
    }
}

/// Bot authority from its roles and the guild's role list
///
/// The base role (ID equal to the guild ID) always applies.
fn authority_from_roles(
    guild_id: Snowflake,
    bot_roles: &BTreeSet<Snowflake>,
    roles: &[LiveRole],
) -> BotAuthority {
    let held: Vec<&LiveRole> = roles
        .iter()
        .filter(|role| role.id == guild_id || bot_roles.contains(&role.id))
        .collect();

    BotAuthority {
        highest_position: held.iter().map(|role| role.position).max().unwrap_or(0),
        has_manage_roles: Permissions::combine(held.iter().map(|role| role.permissions))
            .can_manage_roles(),
    }
}

#[async_trait]
impl MembershipPlatform for DiscordClient {
    #[instrument(skip(self))]
    async fn fetch_audit_entries(
        &self,
        guild_id: Snowflake,
        query: &AuditLogQuery,
    ) -> PlatformResult<Vec<AuditEntry>> {
        let mut path = format!(
            "/guilds/{guild_id}/audit-logs?action_type={}&limit={}",
            query.kind.action_type(),
            query.limit.min(AuditLogQuery::MAX_LIMIT)
        );
        if let Some(cursor) = query.cursor {
            let side = match query.direction {
                AuditDirection::Before => "before",
                AuditDirection::After => "after",
            };
            path.push_str(&format!("&{side}={cursor}"));
        }

        let page: AuditLogPage = self.get_json(Resource::Guild(guild_id), &path).await?;
        page.audit_log_entries
            .into_iter()
            .map(AuditEntry::try_from)
            .collect()
    }

    #[instrument(skip(self))]
    async fn list_members(&self, guild_id: Snowflake) -> PlatformResult<Vec<LiveMember>> {
        let mut members = Vec::new();
        let mut after = Snowflake::new(0);

        loop {
            let path = format!("/guilds/{guild_id}/members?limit={MEMBER_PAGE_LIMIT}&after={after}");
            let page: Vec<MemberPayload> = self.get_json(Resource::Guild(guild_id), &path).await?;
            let page_len = page.len();

            let live: Vec<LiveMember> = page.into_iter().filter_map(MemberPayload::into_live).collect();
            let Some(last) = live.iter().map(|m| m.id).max() else {
                break;
            };
            members.extend(live);

            if page_len < MEMBER_PAGE_LIMIT || last <= after {
                break;
            }
            after = last;
        }

        debug!(%guild_id, members = members.len(), "Members listed");
        Ok(members)
    }

    #[instrument(skip(self))]
    async fn get_member_live_roles(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
    ) -> PlatformResult<BTreeSet<Snowflake>> {
        Ok(self.get_member(guild_id, member_id).await?.roles)
    }

    #[instrument(skip(self, role_ids), fields(roles = role_ids.len()))]
    async fn replace_member_roles(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
        role_ids: &BTreeSet<Snowflake>,
        reason: &str,
    ) -> PlatformResult<()> {
        let url = self.url(&format!("/guilds/{guild_id}/members/{member_id}"));
        let body = json!({ "roles": role_ids });

        self.send(Resource::Member(member_id), || {
            self.http
                .patch(&url)
                .header(AUDIT_REASON_HEADER, reason)
                .json(&body)
        })
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_bot_authority(&self, guild_id: Snowflake) -> PlatformResult<BotAuthority> {
        let bot_id = self.bot_user_id().await?;
        let bot = self.get_member(guild_id, bot_id).await?;
        let roles = self.list_roles(guild_id).await?;
        Ok(authority_from_roles(guild_id, &bot.roles, &roles))
    }

    #[instrument(skip(self))]
    async fn list_roles(&self, guild_id: Snowflake) -> PlatformResult<Vec<LiveRole>> {
        let roles: Vec<RolePayload> = self
            .get_json(Resource::Guild(guild_id), &format!("/guilds/{guild_id}/roles"))
            .await?;
        Ok(roles.into_iter().map(LiveRole::from).collect())
    }
}
