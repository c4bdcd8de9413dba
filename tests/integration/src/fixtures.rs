//! Test fixtures
//!
//! A guild with a fixed role ladder:
//!
//! | role        | id | position |
//! |-------------|----|----------|
//! | `@everyone` | 1  | 0        |
//! | mark        | 10 | 2        |
//! | A           | 20 | 3        |
//! | B           | 21 | 4        |
//! | (bot)       |    | 5        |
//! | high        | 30 | 9        |

use std::sync::Arc;

use keeper_common::SweepConfig;
use keeper_core::entities::{AuditEntry, BotAuthority, LiveRole, RoleChange};
use keeper_core::value_objects::{Permissions, Snowflake};
use keeper_service::{ServiceContext, ServiceContextBuilder};

use crate::fakes::{FakePlatform, MemoryStore};

pub const GUILD: Snowflake = Snowflake::new(1);
pub const MARK: Snowflake = Snowflake::new(10);
pub const ROLE_A: Snowflake = Snowflake::new(20);
pub const ROLE_B: Snowflake = Snowflake::new(21);
pub const ROLE_HIGH: Snowflake = Snowflake::new(30);

pub const ALICE: Snowflake = Snowflake::new(100);
pub const BOB: Snowflake = Snowflake::new(101);
pub const CAROL: Snowflake = Snowflake::new(102);

pub const BOT_POSITION: i32 = 5;

pub fn role(id: Snowflake, position: i32) -> LiveRole {
    LiveRole {
        id,
        position,
        permissions: Permissions::empty(),
    }
}

/// Every role of the test guild
pub fn guild_roles() -> Vec<LiveRole> {
    vec![
        role(GUILD, 0),
        role(MARK, 2),
        role(ROLE_A, 3),
        role(ROLE_B, 4),
        role(ROLE_HIGH, 9),
    ]
}

pub fn bot_authority() -> BotAuthority {
    BotAuthority {
        highest_position: BOT_POSITION,
        has_manage_roles: true,
    }
}

/// Audit entry granting `roles` to `target`
pub fn granted(id: i64, target: Snowflake, roles: &[Snowflake]) -> AuditEntry {
    AuditEntry::new(Snowflake::new(id), target, vec![RoleChange::add(roles.to_vec())])
}

/// Audit entry revoking `roles` from `target`
pub fn revoked(id: i64, target: Snowflake, roles: &[Snowflake]) -> AuditEntry {
    AuditEntry::new(Snowflake::new(id), target, vec![RoleChange::remove(roles.to_vec())])
}

/// Service context wired to in-memory ports
pub struct Harness {
    pub ctx: ServiceContext,
    pub store: Arc<MemoryStore>,
    pub platform: Arc<FakePlatform>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_platform(FakePlatform::new(guild_roles(), bot_authority()))
    }

    pub fn with_platform(platform: FakePlatform) -> Self {
        let store = Arc::new(MemoryStore::new());
        let platform = Arc::new(platform);
        let ctx = ServiceContextBuilder::new()
            .guild_repo(store.clone())
            .rule_repo(store.clone())
            .state_store(store.clone())
            .platform(platform.clone())
            .sweep_config(SweepConfig {
                interval_secs: 1,
                on_startup: true,
                apply_concurrency: 4,
            })
            .build()
            .expect("all ports are set");

        Self {
            ctx,
            store,
            platform,
        }
    }

    /// Harness whose guild already has its mark role stored
    pub async fn initialized() -> Self {
        let harness = Self::new();
        harness.mark_initialized().await;
        harness
    }

    pub async fn mark_initialized(&self) {
        use keeper_core::traits::GuildRepository;

        let applied = self
            .store
            .set_mark_role(GUILD, MARK)
            .await
            .expect("memory store never fails here");
        assert!(applied, "guild already has another mark role");
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
