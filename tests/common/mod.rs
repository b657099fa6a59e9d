#![allow(dead_code)]

//! An in-memory authorization server shared by the async and blocking
//! integration tests, with a hand-cranked clock and per-endpoint call
//! accounting.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use keycloak_adapter::{
    AccessToken, AccessTokenRef, BlockingKeycloakTransport, ClientId, ClientIdRef, ClientRecord,
    ClientSecret, Clock, DurationSecs, Error, KeycloakConfig, KeycloakTransport, RefreshToken,
    RefreshTokenRef, ResourceKind, Result, RetryPolicy, RoleRecord, TokenSet, UnixTime, UserId,
    UserIdRef, UserInfo, UserQuery, UserRecord,
};

/// A clock the tests advance by hand
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UnixTime {
        UnixTime(self.0.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Default)]
pub struct ServerState {
    users: HashMap<String, Value>,
    realm_roles: Vec<RoleRecord>,
    user_realm_roles: HashMap<String, Vec<RoleRecord>>,
    client_roles: HashMap<String, Vec<RoleRecord>>,
    user_client_roles: HashMap<(String, String), Vec<RoleRecord>>,
    clients: Vec<ClientRecord>,
    service_accounts: HashMap<String, String>,
    active_tokens: HashSet<String>,
    token_subjects: HashMap<String, String>,
    granted_permissions: HashSet<String>,
    refresh_rejected: bool,
    failing_token_grants: u32,
    calls: HashMap<&'static str, usize>,
    next_user: usize,
    next_token: usize,
}

fn role(name: &str) -> RoleRecord {
    RoleRecord {
        id: Some(format!("role-{name}")),
        name: name.to_owned(),
        description: None,
        rest: Map::new(),
    }
}

/// One fake server instance plus the clock that drives it
#[derive(Clone, Debug, Default)]
pub struct Harness {
    pub clock: ManualClock,
    state: Arc<Mutex<ServerState>>,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport(&self) -> FakeTransport {
        FakeTransport {
            core: self.core(),
            token_latency: None,
        }
    }

    pub fn transport_with_token_latency(&self, latency: Duration) -> FakeTransport {
        FakeTransport {
            core: self.core(),
            token_latency: Some(latency),
        }
    }

    pub fn blocking_transport(&self) -> BlockingFakeTransport {
        BlockingFakeTransport { core: self.core() }
    }

    fn core(&self) -> FakeCore {
        FakeCore {
            state: Arc::clone(&self.state),
            clock: self.clock.clone(),
        }
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.lock().calls.get(endpoint).copied().unwrap_or(0)
    }

    pub fn add_user(&self, id: &str, username: &str, email: &str) {
        self.lock().users.insert(
            id.to_owned(),
            json!({ "id": id, "username": username, "email": email }),
        );
    }

    pub fn add_realm_role(&self, name: &str) {
        self.lock().realm_roles.push(role(name));
    }

    pub fn add_client(&self, client_id: &str, internal_id: &str) {
        self.lock().clients.push(ClientRecord {
            id: internal_id.to_owned(),
            client_id: client_id.to_owned(),
            secret: Some(format!("{internal_id}-secret")),
            rest: Map::new(),
        });
    }

    pub fn add_client_role(&self, internal_id: &str, name: &str) {
        self.lock()
            .client_roles
            .entry(internal_id.to_owned())
            .or_default()
            .push(role(name));
    }

    pub fn add_service_account(&self, internal_id: &str, user_id: &str) {
        self.lock()
            .service_accounts
            .insert(internal_id.to_owned(), user_id.to_owned());
    }

    /// Marks a bearer token active and bound to a subject
    pub fn issue_user_token(&self, token: &str, subject: &str) {
        let mut state = self.lock();
        state.active_tokens.insert(token.to_owned());
        state
            .token_subjects
            .insert(token.to_owned(), subject.to_owned());
    }

    pub fn revoke_user_token(&self, token: &str) {
        self.lock().active_tokens.remove(token);
    }

    pub fn grant_permission(&self, permission: &str) {
        self.lock()
            .granted_permissions
            .insert(permission.to_owned());
    }

    /// Makes every subsequent refresh attempt fail as an authentication
    /// rejection
    pub fn reject_refreshes(&self) {
        self.lock().refresh_rejected = true;
    }

    /// Makes the next `n` token grants fail transiently
    pub fn fail_next_token_grants(&self, n: u32) {
        self.lock().failing_token_grants = n;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }
}

/// A config pointed at the fake server: 10 s token safety margin and a
/// fast retry schedule so tests do not sit in real backoff delays
pub fn test_config() -> KeycloakConfig {
    KeycloakConfig::builder("https://sso.test", "acme", ClientId::from_static("backend"))
        .client_secret(ClientSecret::from_static("s3cr3t"))
        .token_safety_margin(DurationSecs(10))
        .retry_policy(RetryPolicy::new(
            3,
            Duration::from_millis(1),
            Duration::from_millis(4),
            2,
        ))
        .build()
        .unwrap()
}

#[derive(Clone, Debug)]
struct FakeCore {
    state: Arc<Mutex<ServerState>>,
    clock: ManualClock,
}

impl FakeCore {
    fn lock(&self) -> std::sync::MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    fn count(state: &mut ServerState, endpoint: &'static str) {
        *state.calls.entry(endpoint).or_insert(0) += 1;
    }

    fn mint(&self, state: &mut ServerState) -> TokenSet {
        state.next_token += 1;
        let n = state.next_token;
        TokenSet::with_clock(
            AccessToken::new(format!("admin-{n}")),
            Some(RefreshToken::new(format!("refresh-{n}"))),
            "Bearer",
            None,
            DurationSecs(60),
            &self.clock,
        )
    }

    fn grant(&self) -> Result<TokenSet> {
        let mut state = self.lock();
        Self::count(&mut state, "token_grant");
        if state.failing_token_grants > 0 {
            state.failing_token_grants -= 1;
            return Err(Error::ServiceUnavailable { source: None });
        }
        Ok(self.mint(&mut state))
    }

    fn refresh(&self) -> Result<TokenSet> {
        let mut state = self.lock();
        Self::count(&mut state, "token_refresh");
        if state.refresh_rejected {
            return Err(Error::Authentication {
                reason: String::from("invalid_grant"),
            });
        }
        Ok(self.mint(&mut state))
    }

    fn logout(&self) -> Result<()> {
        Self::count(&mut self.lock(), "logout");
        Ok(())
    }

    fn introspect(&self, token: &AccessTokenRef) -> Result<Value> {
        let mut state = self.lock();
        Self::count(&mut state, "introspect");
        Ok(json!({ "active": state.active_tokens.contains(token.as_str()) }))
    }

    fn userinfo(&self, token: &AccessTokenRef) -> Result<UserInfo> {
        let mut state = self.lock();
        Self::count(&mut state, "userinfo");
        match state.token_subjects.get(token.as_str()) {
            Some(subject) => Ok(UserInfo {
                sub: UserId::new(subject.clone()),
                claims: Map::new(),
            }),
            None => Err(Error::TokenExpired),
        }
    }

    fn uma_decision(&self, permission: &str) -> Result<bool> {
        let mut state = self.lock();
        Self::count(&mut state, "uma_decision");
        Ok(state.granted_permissions.contains(permission))
    }

    fn realm_public_key(&self) -> Result<String> {
        Self::count(&mut self.lock(), "public_key");
        Ok(String::from(
            "-----BEGIN PUBLIC KEY-----\nMIIB\n-----END PUBLIC KEY-----",
        ))
    }

    fn well_known(&self) -> Result<Value> {
        Self::count(&mut self.lock(), "well_known");
        Ok(json!({ "issuer": "https://sso.test/realms/acme" }))
    }

    fn certs(&self) -> Result<Value> {
        Self::count(&mut self.lock(), "certs");
        Ok(json!({ "keys": [] }))
    }

    fn get_user(&self, user_id: &UserIdRef) -> Result<Option<UserRecord>> {
        let mut state = self.lock();
        Self::count(&mut state, "get_user");
        match state.users.get(user_id.as_str()) {
            Some(rep) => Ok(Some(serde_json::from_value(rep.clone()).unwrap())),
            None => Ok(None),
        }
    }

    fn find_users(&self, query: &UserQuery) -> Result<Vec<UserRecord>> {
        let mut state = self.lock();
        Self::count(&mut state, "find_users");
        let mut found: Vec<UserRecord> = state
            .users
            .values()
            .filter(|rep| {
                let field = |name: &str| rep.get(name).and_then(Value::as_str).unwrap_or("");
                if let Some(username) = &query.username {
                    return field("username") == username;
                }
                if let Some(email) = &query.email {
                    return field("email") == email;
                }
                if let Some(term) = &query.search {
                    return field("username").contains(term.as_str())
                        || field("email").contains(term.as_str());
                }
                true
            })
            .map(|rep| serde_json::from_value(rep.clone()).unwrap())
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        if let Some(max) = query.max {
            found.truncate(max as usize);
        }
        Ok(found)
    }

    fn create_user(&self, representation: &Value) -> Result<UserId> {
        let mut state = self.lock();
        Self::count(&mut state, "create_user");
        state.next_user += 1;
        while state.users.contains_key(&format!("u-{}", state.next_user)) {
            state.next_user += 1;
        }
        let id = format!("u-{}", state.next_user);
        let mut rep = representation.clone();
        rep["id"] = json!(id);
        state.users.insert(id.clone(), rep);
        Ok(UserId::new(id))
    }

    fn update_user(&self, user_id: &UserIdRef, representation: &Value) -> Result<()> {
        let mut state = self.lock();
        Self::count(&mut state, "update_user");
        let existing = state
            .users
            .get_mut(user_id.as_str())
            .ok_or(Error::NotFound {
                kind: ResourceKind::User,
            })?;
        if let (Some(existing), Some(updates)) =
            (existing.as_object_mut(), representation.as_object())
        {
            for (key, value) in updates {
                existing.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    fn delete_user(&self, user_id: &UserIdRef) -> Result<()> {
        let mut state = self.lock();
        Self::count(&mut state, "delete_user");
        state
            .users
            .remove(user_id.as_str())
            .map(drop)
            .ok_or(Error::NotFound {
                kind: ResourceKind::User,
            })
    }

    fn reset_password(&self, user_id: &UserIdRef) -> Result<()> {
        let mut state = self.lock();
        Self::count(&mut state, "reset_password");
        if state.users.contains_key(user_id.as_str()) {
            Ok(())
        } else {
            Err(Error::NotFound {
                kind: ResourceKind::User,
            })
        }
    }

    fn logout_user(&self, _user_id: &UserIdRef) -> Result<()> {
        Self::count(&mut self.lock(), "logout_user");
        Ok(())
    }

    fn realm_roles(&self) -> Result<Vec<RoleRecord>> {
        let mut state = self.lock();
        Self::count(&mut state, "realm_roles");
        Ok(state.realm_roles.clone())
    }

    fn realm_role(&self, name: &str) -> Result<Option<RoleRecord>> {
        let mut state = self.lock();
        Self::count(&mut state, "realm_role");
        Ok(state.realm_roles.iter().find(|r| r.name == name).cloned())
    }

    fn create_realm_role(&self, representation: &Value) -> Result<()> {
        let mut state = self.lock();
        Self::count(&mut state, "create_realm_role");
        let name = representation
            .get("name")
            .and_then(Value::as_str)
            .unwrap()
            .to_owned();
        let description = representation
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_owned);
        state.realm_roles.push(RoleRecord {
            description,
            ..role(&name)
        });
        Ok(())
    }

    fn delete_realm_role(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        Self::count(&mut state, "delete_realm_role");
        let before = state.realm_roles.len();
        state.realm_roles.retain(|r| r.name != name);
        if state.realm_roles.len() == before {
            return Err(Error::NotFound {
                kind: ResourceKind::Role,
            });
        }
        for roles in state.user_realm_roles.values_mut() {
            roles.retain(|r| r.name != name);
        }
        Ok(())
    }

    fn user_realm_roles(&self, user_id: &UserIdRef) -> Result<Vec<RoleRecord>> {
        let mut state = self.lock();
        Self::count(&mut state, "user_realm_roles");
        Ok(state
            .user_realm_roles
            .get(user_id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    fn assign_realm_roles(&self, user_id: &UserIdRef, roles: &[RoleRecord]) -> Result<()> {
        let mut state = self.lock();
        Self::count(&mut state, "assign_realm_roles");
        state
            .user_realm_roles
            .entry(user_id.as_str().to_owned())
            .or_default()
            .extend(roles.iter().cloned());
        Ok(())
    }

    fn remove_realm_roles(&self, user_id: &UserIdRef, roles: &[RoleRecord]) -> Result<()> {
        let mut state = self.lock();
        Self::count(&mut state, "remove_realm_roles");
        if let Some(held) = state.user_realm_roles.get_mut(user_id.as_str()) {
            held.retain(|r| !roles.iter().any(|removed| removed.name == r.name));
        }
        Ok(())
    }

    fn user_client_roles(
        &self,
        user_id: &UserIdRef,
        client_internal_id: &str,
    ) -> Result<Vec<RoleRecord>> {
        let mut state = self.lock();
        Self::count(&mut state, "user_client_roles");
        Ok(state
            .user_client_roles
            .get(&(user_id.as_str().to_owned(), client_internal_id.to_owned()))
            .cloned()
            .unwrap_or_default())
    }

    fn client_role(&self, client_internal_id: &str, name: &str) -> Result<Option<RoleRecord>> {
        let mut state = self.lock();
        Self::count(&mut state, "client_role");
        Ok(state
            .client_roles
            .get(client_internal_id)
            .and_then(|roles| roles.iter().find(|r| r.name == name).cloned()))
    }

    fn assign_client_roles(
        &self,
        user_id: &UserIdRef,
        client_internal_id: &str,
        roles: &[RoleRecord],
    ) -> Result<()> {
        let mut state = self.lock();
        Self::count(&mut state, "assign_client_roles");
        state
            .user_client_roles
            .entry((user_id.as_str().to_owned(), client_internal_id.to_owned()))
            .or_default()
            .extend(roles.iter().cloned());
        Ok(())
    }

    fn remove_client_roles(
        &self,
        user_id: &UserIdRef,
        client_internal_id: &str,
        roles: &[RoleRecord],
    ) -> Result<()> {
        let mut state = self.lock();
        Self::count(&mut state, "remove_client_roles");
        if let Some(held) = state
            .user_client_roles
            .get_mut(&(user_id.as_str().to_owned(), client_internal_id.to_owned()))
        {
            held.retain(|r| !roles.iter().any(|removed| removed.name == r.name));
        }
        Ok(())
    }

    fn find_client(&self, client_id: &ClientIdRef) -> Result<Option<ClientRecord>> {
        let mut state = self.lock();
        Self::count(&mut state, "find_client");
        Ok(state
            .clients
            .iter()
            .find(|c| c.client_id == client_id.as_str())
            .cloned())
    }

    fn service_account_user(&self, client_internal_id: &str) -> Result<UserRecord> {
        let mut state = self.lock();
        Self::count(&mut state, "service_account_user");
        let user_id = state
            .service_accounts
            .get(client_internal_id)
            .cloned()
            .ok_or(Error::NotFound {
                kind: ResourceKind::Client,
            })?;
        Ok(UserRecord {
            id: UserId::new(user_id),
            username: None,
            email: None,
            rest: Map::new(),
        })
    }
}

/// The async face of the fake server
#[derive(Clone, Debug)]
pub struct FakeTransport {
    core: FakeCore,
    token_latency: Option<Duration>,
}

impl FakeTransport {
    async fn token_delay(&self) {
        if let Some(latency) = self.token_latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl KeycloakTransport for FakeTransport {
    async fn token_password_grant(&self, _username: &str, _password: &str) -> Result<TokenSet> {
        self.token_delay().await;
        self.core.grant()
    }

    async fn token_client_credentials(&self) -> Result<TokenSet> {
        self.token_delay().await;
        self.core.grant()
    }

    async fn token_authorization_code(
        &self,
        _code: &str,
        _redirect_uri: &str,
    ) -> Result<TokenSet> {
        self.core.grant()
    }

    async fn token_refresh(&self, _refresh_token: &RefreshTokenRef) -> Result<TokenSet> {
        self.token_delay().await;
        self.core.refresh()
    }

    async fn logout(&self, _refresh_token: &RefreshTokenRef) -> Result<()> {
        self.core.logout()
    }

    async fn introspect(&self, token: &AccessTokenRef) -> Result<Value> {
        self.core.introspect(token)
    }

    async fn userinfo(&self, token: &AccessTokenRef) -> Result<UserInfo> {
        self.core.userinfo(token)
    }

    async fn uma_decision(&self, _token: &AccessTokenRef, permission: &str) -> Result<bool> {
        self.core.uma_decision(permission)
    }

    async fn realm_public_key(&self) -> Result<String> {
        self.core.realm_public_key()
    }

    async fn well_known(&self) -> Result<Value> {
        self.core.well_known()
    }

    async fn certs(&self) -> Result<Value> {
        self.core.certs()
    }

    async fn get_user(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
    ) -> Result<Option<UserRecord>> {
        self.core.get_user(user_id)
    }

    async fn find_users(
        &self,
        _admin: &AccessTokenRef,
        query: &UserQuery,
    ) -> Result<Vec<UserRecord>> {
        self.core.find_users(query)
    }

    async fn create_user(&self, _admin: &AccessTokenRef, representation: &Value) -> Result<UserId> {
        self.core.create_user(representation)
    }

    async fn update_user(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        representation: &Value,
    ) -> Result<()> {
        self.core.update_user(user_id, representation)
    }

    async fn delete_user(&self, _admin: &AccessTokenRef, user_id: &UserIdRef) -> Result<()> {
        self.core.delete_user(user_id)
    }

    async fn reset_password(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        _password: &str,
        _temporary: bool,
    ) -> Result<()> {
        self.core.reset_password(user_id)
    }

    async fn logout_user(&self, _admin: &AccessTokenRef, user_id: &UserIdRef) -> Result<()> {
        self.core.logout_user(user_id)
    }

    async fn realm_roles(&self, _admin: &AccessTokenRef) -> Result<Vec<RoleRecord>> {
        self.core.realm_roles()
    }

    async fn realm_role(&self, _admin: &AccessTokenRef, name: &str) -> Result<Option<RoleRecord>> {
        self.core.realm_role(name)
    }

    async fn create_realm_role(
        &self,
        _admin: &AccessTokenRef,
        representation: &Value,
    ) -> Result<()> {
        self.core.create_realm_role(representation)
    }

    async fn delete_realm_role(&self, _admin: &AccessTokenRef, name: &str) -> Result<()> {
        self.core.delete_realm_role(name)
    }

    async fn user_realm_roles(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
    ) -> Result<Vec<RoleRecord>> {
        self.core.user_realm_roles(user_id)
    }

    async fn assign_realm_roles(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        roles: &[RoleRecord],
    ) -> Result<()> {
        self.core.assign_realm_roles(user_id, roles)
    }

    async fn remove_realm_roles(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        roles: &[RoleRecord],
    ) -> Result<()> {
        self.core.remove_realm_roles(user_id, roles)
    }

    async fn user_client_roles(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
    ) -> Result<Vec<RoleRecord>> {
        self.core.user_client_roles(user_id, client_internal_id)
    }

    async fn client_role(
        &self,
        _admin: &AccessTokenRef,
        client_internal_id: &str,
        name: &str,
    ) -> Result<Option<RoleRecord>> {
        self.core.client_role(client_internal_id, name)
    }

    async fn assign_client_roles(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
        roles: &[RoleRecord],
    ) -> Result<()> {
        self.core
            .assign_client_roles(user_id, client_internal_id, roles)
    }

    async fn remove_client_roles(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
        roles: &[RoleRecord],
    ) -> Result<()> {
        self.core
            .remove_client_roles(user_id, client_internal_id, roles)
    }

    async fn find_client(
        &self,
        _admin: &AccessTokenRef,
        client_id: &ClientIdRef,
    ) -> Result<Option<ClientRecord>> {
        self.core.find_client(client_id)
    }

    async fn service_account_user(
        &self,
        _admin: &AccessTokenRef,
        client_internal_id: &str,
    ) -> Result<UserRecord> {
        self.core.service_account_user(client_internal_id)
    }
}

/// The blocking face of the fake server, backed by the same state
#[derive(Clone, Debug)]
pub struct BlockingFakeTransport {
    core: FakeCore,
}

impl BlockingKeycloakTransport for BlockingFakeTransport {
    fn token_password_grant(&self, _username: &str, _password: &str) -> Result<TokenSet> {
        self.core.grant()
    }

    fn token_client_credentials(&self) -> Result<TokenSet> {
        self.core.grant()
    }

    fn token_authorization_code(&self, _code: &str, _redirect_uri: &str) -> Result<TokenSet> {
        self.core.grant()
    }

    fn token_refresh(&self, _refresh_token: &RefreshTokenRef) -> Result<TokenSet> {
        self.core.refresh()
    }

    fn logout(&self, _refresh_token: &RefreshTokenRef) -> Result<()> {
        self.core.logout()
    }

    fn introspect(&self, token: &AccessTokenRef) -> Result<Value> {
        self.core.introspect(token)
    }

    fn userinfo(&self, token: &AccessTokenRef) -> Result<UserInfo> {
        self.core.userinfo(token)
    }

    fn uma_decision(&self, _token: &AccessTokenRef, permission: &str) -> Result<bool> {
        self.core.uma_decision(permission)
    }

    fn realm_public_key(&self) -> Result<String> {
        self.core.realm_public_key()
    }

    fn well_known(&self) -> Result<Value> {
        self.core.well_known()
    }

    fn certs(&self) -> Result<Value> {
        self.core.certs()
    }

    fn get_user(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
    ) -> Result<Option<UserRecord>> {
        self.core.get_user(user_id)
    }

    fn find_users(&self, _admin: &AccessTokenRef, query: &UserQuery) -> Result<Vec<UserRecord>> {
        self.core.find_users(query)
    }

    fn create_user(&self, _admin: &AccessTokenRef, representation: &Value) -> Result<UserId> {
        self.core.create_user(representation)
    }

    fn update_user(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        representation: &Value,
    ) -> Result<()> {
        self.core.update_user(user_id, representation)
    }

    fn delete_user(&self, _admin: &AccessTokenRef, user_id: &UserIdRef) -> Result<()> {
        self.core.delete_user(user_id)
    }

    fn reset_password(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        _password: &str,
        _temporary: bool,
    ) -> Result<()> {
        self.core.reset_password(user_id)
    }

    fn logout_user(&self, _admin: &AccessTokenRef, user_id: &UserIdRef) -> Result<()> {
        self.core.logout_user(user_id)
    }

    fn realm_roles(&self, _admin: &AccessTokenRef) -> Result<Vec<RoleRecord>> {
        self.core.realm_roles()
    }

    fn realm_role(&self, _admin: &AccessTokenRef, name: &str) -> Result<Option<RoleRecord>> {
        self.core.realm_role(name)
    }

    fn create_realm_role(&self, _admin: &AccessTokenRef, representation: &Value) -> Result<()> {
        self.core.create_realm_role(representation)
    }

    fn delete_realm_role(&self, _admin: &AccessTokenRef, name: &str) -> Result<()> {
        self.core.delete_realm_role(name)
    }

    fn user_realm_roles(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
    ) -> Result<Vec<RoleRecord>> {
        self.core.user_realm_roles(user_id)
    }

    fn assign_realm_roles(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        roles: &[RoleRecord],
    ) -> Result<()> {
        self.core.assign_realm_roles(user_id, roles)
    }

    fn remove_realm_roles(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        roles: &[RoleRecord],
    ) -> Result<()> {
        self.core.remove_realm_roles(user_id, roles)
    }

    fn user_client_roles(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
    ) -> Result<Vec<RoleRecord>> {
        self.core.user_client_roles(user_id, client_internal_id)
    }

    fn client_role(
        &self,
        _admin: &AccessTokenRef,
        client_internal_id: &str,
        name: &str,
    ) -> Result<Option<RoleRecord>> {
        self.core.client_role(client_internal_id, name)
    }

    fn assign_client_roles(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
        roles: &[RoleRecord],
    ) -> Result<()> {
        self.core
            .assign_client_roles(user_id, client_internal_id, roles)
    }

    fn remove_client_roles(
        &self,
        _admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
        roles: &[RoleRecord],
    ) -> Result<()> {
        self.core
            .remove_client_roles(user_id, client_internal_id, roles)
    }

    fn find_client(
        &self,
        _admin: &AccessTokenRef,
        client_id: &ClientIdRef,
    ) -> Result<Option<ClientRecord>> {
        self.core.find_client(client_id)
    }

    fn service_account_user(
        &self,
        _admin: &AccessTokenRef,
        client_internal_id: &str,
    ) -> Result<UserRecord> {
        self.core.service_account_user(client_internal_id)
    }
}
