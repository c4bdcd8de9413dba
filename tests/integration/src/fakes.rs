//! In-memory ports
//!
//! `MemoryStore` implements the persistence ports, `FakePlatform` the
//! membership platform. Both expose inspection helpers and failure switches.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use keeper_core::entities::{
    AuditEntry, BotAuthority, Guild, LiveMember, LiveRole, Member, PersistentRoleRule,
    WelcomeMessage,
};
use keeper_core::error::DomainError;
use keeper_core::traits::{
    AuditDirection, AuditLogQuery, GuildRepository, MembershipPlatform, PlatformResult,
    RepoResult, RoleRuleRepository, RoleStateStore,
};
use keeper_core::value_objects::Snowflake;
use tokio::sync::{RwLock, RwLockWriteGuard};

// ============================================================================
// MemoryStore
// ============================================================================

#[derive(Default)]
struct StoreState {
    guilds: BTreeMap<Snowflake, Guild>,
    rules: BTreeMap<(Snowflake, Snowflake), PersistentRoleRule>,
    members: BTreeMap<(Snowflake, Snowflake), Option<Snowflake>>,
    flags: BTreeMap<(Snowflake, Snowflake, Snowflake), bool>,
}

/// Persistence ports backed by maps; each call is atomic
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    fail_set_flags: AtomicBool,
    set_flags_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later flag write fail
    pub fn fail_set_flags(&self, fail: bool) {
        self.fail_set_flags.store(fail, Ordering::SeqCst);
    }

    pub fn set_flags_calls(&self) -> usize {
        self.set_flags_calls.load(Ordering::SeqCst)
    }

    /// Write a flag directly, bypassing the engine
    pub fn seed_flag(&self, guild_id: Snowflake, member_id: Snowflake, role_id: Snowflake, flag: bool) {
        let mut state = self.state.lock().unwrap();
        state.members.entry((guild_id, member_id)).or_insert(None);
        state.flags.insert((guild_id, member_id, role_id), flag);
    }

    /// Write a rule directly, skipping role validation
    pub fn seed_rule(&self, rule: PersistentRoleRule) {
        let mut state = self.state.lock().unwrap();
        state.rules.insert((rule.guild_id, rule.role_id), rule);
    }

    /// Every stored flag of one member
    pub fn flags_of(&self, guild_id: Snowflake, member_id: Snowflake) -> BTreeMap<Snowflake, bool> {
        let state = self.state.lock().unwrap();
        state
            .flags
            .iter()
            .filter(|((g, m, _), _)| *g == guild_id && *m == member_id)
            .map(|((_, _, role_id), flag)| (*role_id, *flag))
            .collect()
    }

    pub fn member_cursor(&self, guild_id: Snowflake, member_id: Snowflake) -> Option<Snowflake> {
        let state = self.state.lock().unwrap();
        state.members.get(&(guild_id, member_id)).copied().flatten()
    }

    pub fn guild_cursor(&self, guild_id: Snowflake) -> Option<Snowflake> {
        let state = self.state.lock().unwrap();
        state
            .guilds
            .get(&guild_id)
            .and_then(|guild| guild.last_audit_cursor)
    }

    fn with_guild<T>(&self, id: Snowflake, f: impl FnOnce(&mut Guild) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        let guild = state.guilds.entry(id).or_insert_with(|| Guild::new(id));
        f(guild)
    }
}

#[async_trait]
impl GuildRepository for MemoryStore {
    async fn get_or_create(&self, id: Snowflake) -> RepoResult<Guild> {
        Ok(self.with_guild(id, |guild| guild.clone()))
    }

    async fn find_initialized(&self) -> RepoResult<Vec<Guild>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .guilds
            .values()
            .filter(|guild| guild.is_initialized())
            .cloned()
            .collect())
    }

    async fn set_mark_role(&self, id: Snowflake, role_id: Snowflake) -> RepoResult<bool> {
        Ok(self.with_guild(id, |guild| {
            let accepted = guild.accepts_mark_role(role_id);
            if accepted {
                guild.set_mark_role(role_id);
            }
            accepted
        }))
    }

    async fn set_welcome(&self, id: Snowflake, welcome: Option<&WelcomeMessage>) -> RepoResult<()> {
        self.with_guild(id, |guild| guild.welcome = welcome.cloned());
        Ok(())
    }
}

#[async_trait]
impl RoleRuleRepository for MemoryStore {
    async fn upsert(&self, rule: &PersistentRoleRule) -> RepoResult<()> {
        self.seed_rule(rule.clone());
        Ok(())
    }

    async fn delete(&self, guild_id: Snowflake, role_id: Snowflake) -> RepoResult<bool> {
        let mut state = self.state.lock().unwrap();
        Ok(state.rules.remove(&(guild_id, role_id)).is_some())
    }

    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<PersistentRoleRule>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .rules
            .values()
            .filter(|rule| rule.guild_id == guild_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RoleStateStore for MemoryStore {
    async fn get_member(&self, guild_id: Snowflake, member_id: Snowflake) -> RepoResult<Member> {
        let mut state = self.state.lock().unwrap();
        let cursor = *state.members.entry((guild_id, member_id)).or_insert(None);
        Ok(Member {
            guild_id,
            member_id,
            role_updated_at: cursor,
        })
    }

    async fn get_cursor(&self, guild_id: Snowflake, member_id: Snowflake) -> RepoResult<Option<Snowflake>> {
        Ok(self.get_member(guild_id, member_id).await?.role_updated_at)
    }

    async fn set_cursor(&self, guild_id: Snowflake, member_id: Snowflake, audit_id: Snowflake) -> RepoResult<()> {
        let mut state = self.state.lock().unwrap();
        let cursor = state.members.entry((guild_id, member_id)).or_insert(None);
        *cursor = Snowflake::newest(*cursor, Some(audit_id));
        Ok(())
    }

    async fn get_guild_cursor(&self, guild_id: Snowflake) -> RepoResult<Option<Snowflake>> {
        Ok(self.guild_cursor(guild_id))
    }

    async fn set_guild_cursor(&self, guild_id: Snowflake, audit_id: Snowflake) -> RepoResult<()> {
        self.with_guild(guild_id, |guild| {
            guild.last_audit_cursor = Snowflake::newest(guild.last_audit_cursor, Some(audit_id));
        });
        Ok(())
    }

    async fn get_flags(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
        role_ids: &[Snowflake],
    ) -> RepoResult<HashMap<Snowflake, bool>> {
        let state = self.state.lock().unwrap();
        Ok(role_ids
            .iter()
            .filter_map(|role_id| {
                state
                    .flags
                    .get(&(guild_id, member_id, *role_id))
                    .map(|flag| (*role_id, *flag))
            })
            .collect())
    }

    async fn set_flags(
        &self,
        guild_id: Snowflake,
        member_id: Snowflake,
        flags: &HashMap<Snowflake, bool>,
    ) -> RepoResult<()> {
        self.set_flags_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_set_flags.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("injected set_flags failure".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        state.members.entry((guild_id, member_id)).or_insert(None);
        for (role_id, flag) in flags {
            state.flags.insert((guild_id, member_id, *role_id), *flag);
        }
        Ok(())
    }

    async fn delete_all_flags(&self, guild_id: Snowflake) -> RepoResult<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.flags.len();
        state.flags.retain(|(g, _, _), _| *g != guild_id);
        Ok((before - state.flags.len()) as u64)
    }

    async fn replace_all_flags(
        &self,
        guild_id: Snowflake,
        flags: &BTreeMap<Snowflake, HashMap<Snowflake, bool>>,
    ) -> RepoResult<u64> {
        if self.fail_set_flags.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("injected replace_all_flags failure".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        let before = state.flags.len();
        state.flags.retain(|(g, _, _), _| *g != guild_id);
        let cleared = (before - state.flags.len()) as u64;

        for (member_id, member_flags) in flags {
            state.members.entry((guild_id, *member_id)).or_insert(None);
            for (role_id, flag) in member_flags {
                state.flags.insert((guild_id, *member_id, *role_id), *flag);
            }
        }
        Ok(cleared)
    }
}

// ============================================================================
// FakePlatform
// ============================================================================

/// One recorded `replace_member_roles` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceCall {
    pub member_id: Snowflake,
    pub roles: BTreeSet<Snowflake>,
    pub reason: String,
}

struct PlatformState {
    audit: Vec<AuditEntry>,
    members: BTreeMap<Snowflake, BTreeSet<Snowflake>>,
    roles: BTreeMap<Snowflake, LiveRole>,
    authority: BotAuthority,
    replace_calls: Vec<ReplaceCall>,
    failing_replaces: usize,
    fail_audit: bool,
}

/// Platform with a newest-first paged audit log and a role hierarchy
pub struct FakePlatform {
    state: Mutex<PlatformState>,
    page_size: usize,
    audit_fetches: AtomicUsize,
    audit_gate: RwLock<()>,
}

impl FakePlatform {
    pub fn new(roles: Vec<LiveRole>, authority: BotAuthority) -> Self {
        Self::with_page_size(roles, authority, usize::from(AuditLogQuery::MAX_LIMIT))
    }

    pub fn with_page_size(roles: Vec<LiveRole>, authority: BotAuthority, page_size: usize) -> Self {
        Self {
            state: Mutex::new(PlatformState {
                audit: Vec::new(),
                members: BTreeMap::new(),
                roles: roles.into_iter().map(|role| (role.id, role)).collect(),
                authority,
                replace_calls: Vec::new(),
                failing_replaces: 0,
                fail_audit: false,
            }),
            page_size: page_size.max(1),
            audit_fetches: AtomicUsize::new(0),
            audit_gate: RwLock::new(()),
        }
    }

    /// Append audit entries (any order)
    pub fn push_audit(&self, entries: impl IntoIterator<Item = AuditEntry>) {
        let mut state = self.state.lock().unwrap();
        state.audit.extend(entries);
        state.audit.sort_by_key(|entry| entry.id);
    }

    /// Add or replace a member with the given live roles
    pub fn join(&self, member_id: Snowflake, roles: impl IntoIterator<Item = Snowflake>) {
        let mut state = self.state.lock().unwrap();
        state.members.insert(member_id, roles.into_iter().collect());
    }

    pub fn leave(&self, member_id: Snowflake) {
        self.state.lock().unwrap().members.remove(&member_id);
    }

    pub fn remove_role(&self, role_id: Snowflake) {
        self.state.lock().unwrap().roles.remove(&role_id);
    }

    pub fn set_authority(&self, authority: BotAuthority) {
        self.state.lock().unwrap().authority = authority;
    }

    pub fn live_roles(&self, member_id: Snowflake) -> BTreeSet<Snowflake> {
        let state = self.state.lock().unwrap();
        state.members.get(&member_id).cloned().unwrap_or_default()
    }

    pub fn replace_calls(&self) -> Vec<ReplaceCall> {
        self.state.lock().unwrap().replace_calls.clone()
    }

    /// Make the next `count` role replacements fail
    pub fn fail_next_replaces(&self, count: usize) {
        self.state.lock().unwrap().failing_replaces = count;
    }

    pub fn fail_audit(&self, fail: bool) {
        self.state.lock().unwrap().fail_audit = fail;
    }

    pub fn audit_fetches(&self) -> usize {
        self.audit_fetches.load(Ordering::SeqCst)
    }

    /// Block every audit fetch until the returned guard is dropped
    pub async fn hold_audit(&self) -> RwLockWriteGuard<'_, ()> {
        self.audit_gate.write().await
    }
}

#[async_trait]
impl MembershipPlatform for FakePlatform {
    async fn fetch_audit_entries(
        &self,
        _guild_id: Snowflake,
        query: &AuditLogQuery,
    ) -> PlatformResult<Vec<AuditEntry>> {
        let _gate = self.audit_gate.read().await;
        self.audit_fetches.fetch_add(1, Ordering::SeqCst);

        let state = self.state.lock().unwrap();
        if state.fail_audit {
            return Err(DomainError::Platform("injected audit failure".to_string()));
        }

        let limit = self.page_size.min(usize::from(query.limit));
        let mut page: Vec<AuditEntry> = match (query.direction, query.cursor) {
            (AuditDirection::After, Some(cursor)) => state
                .audit
                .iter()
                .filter(|entry| entry.id > cursor)
                .take(limit)
                .cloned()
                .collect(),
            (_, cursor) => state
                .audit
                .iter()
                .rev()
                .filter(|entry| cursor.is_none_or(|cursor| entry.id < cursor))
                .take(limit)
                .cloned()
                .collect(),
        };
        // The platform always answers newest first
        page.sort_by_key(|entry| std::cmp::Reverse(entry.id));
        Ok(page)
    }

    async fn list_members(&self, _guild_id: Snowflake) -> PlatformResult<Vec<LiveMember>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .members
            .iter()
            .map(|(id, roles)| LiveMember {
                id: *id,
                role_ids: roles.clone(),
            })
            .collect())
    }

    async fn get_member_live_roles(
        &self,
        _guild_id: Snowflake,
        member_id: Snowflake,
    ) -> PlatformResult<BTreeSet<Snowflake>> {
        let state = self.state.lock().unwrap();
        state
            .members
            .get(&member_id)
            .cloned()
            .ok_or(DomainError::MemberNotFound(member_id))
    }

    async fn replace_member_roles(
        &self,
        _guild_id: Snowflake,
        member_id: Snowflake,
        role_ids: &BTreeSet<Snowflake>,
        reason: &str,
    ) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.replace_calls.push(ReplaceCall {
            member_id,
            roles: role_ids.clone(),
            reason: reason.to_string(),
        });

        if state.failing_replaces > 0 {
            state.failing_replaces -= 1;
            return Err(DomainError::Platform("injected replace failure".to_string()));
        }

        let Some(roles) = state.members.get_mut(&member_id) else {
            return Err(DomainError::MemberNotFound(member_id));
        };
        roles.clone_from(role_ids);
        Ok(())
    }

    async fn get_bot_authority(&self, _guild_id: Snowflake) -> PlatformResult<BotAuthority> {
        Ok(self.state.lock().unwrap().authority)
    }

    async fn list_roles(&self, _guild_id: Snowflake) -> PlatformResult<Vec<LiveRole>> {
        Ok(self.state.lock().unwrap().roles.values().copied().collect())
    }
}
