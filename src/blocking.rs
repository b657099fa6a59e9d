//! The blocking operation facade
//!
//! [`Adapter`](crate::blocking::Adapter) mirrors the non-blocking facade
//! method for method over the blocking transport and a standard mutex.
//! Cache keys, TTLs, invalidation, and the error taxonomy are shared with
//! the non-blocking side, so the two surfaces cannot drift in semantics.

use std::collections::HashSet;
use std::sync::Arc;

use aliri_clock::{Clock, System};
use serde_json::Value;

use crate::braids::{AccessTokenRef, ClientIdRef, ClientSecret, RefreshTokenRef, UserId, UserIdRef};
use crate::cache::{token_fingerprint, CacheKey, CacheOp, CacheValue, TtlCache};
use crate::config::KeycloakConfig;
use crate::errors::{Error, ResourceKind, Result};
use crate::http::BlockingHttpTransport;
use crate::records::{ClientRecord, RoleRecord, UserInfo, UserRecord};
use crate::session::BlockingAdminTokenManager;
use crate::tokens::TokenSet;
use crate::transport::{BlockingKeycloakTransport, UserQuery};

/// A blocking cache-coherent client for one realm of an authorization
/// server
#[derive(Debug)]
pub struct Adapter<T = BlockingHttpTransport, C = System> {
    transport: Arc<T>,
    config: Arc<KeycloakConfig>,
    cache: TtlCache<C>,
    session: BlockingAdminTokenManager<T, C>,
}

impl Adapter {
    /// Constructs an adapter over the bundled blocking HTTP transport
    pub fn new(config: KeycloakConfig) -> Result<Self> {
        let transport = BlockingHttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T> Adapter<T>
where
    T: BlockingKeycloakTransport,
{
    /// Constructs an adapter over a caller-provided transport
    pub fn with_transport(config: KeycloakConfig, transport: T) -> Self {
        Self::with_transport_and_clock(config, transport, System)
    }
}

impl<T, C> Adapter<T, C>
where
    T: BlockingKeycloakTransport,
    C: Clock + Clone,
{
    /// Constructs an adapter over a caller-provided transport and clock
    pub fn with_transport_and_clock(config: KeycloakConfig, transport: T, clock: C) -> Self {
        let transport = Arc::new(transport);
        let config = Arc::new(config);
        Self {
            cache: TtlCache::with_clock(clock.clone()),
            session: BlockingAdminTokenManager::new(
                Arc::clone(&transport),
                Arc::clone(&config),
                clock,
            ),
            transport,
            config,
        }
    }

    /// The configuration this adapter was built from
    pub fn config(&self) -> &KeycloakConfig {
        &self.config
    }

    /// Drops every cached entry; the administrative session is unaffected
    pub fn clear_all_caches(&self) {
        self.cache.clear();
    }

    // ---- authentication ----------------------------------------------

    /// Authenticates a user with the resource-owner password grant
    pub fn authenticate(&self, username: &str, password: &str) -> Result<TokenSet> {
        self.transport.token_password_grant(username, password)
    }

    /// Exchanges an authorization code for tokens
    pub fn exchange_authorization_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenSet> {
        self.transport.token_authorization_code(code, redirect_uri)
    }

    /// Obtains tokens for the configured client itself
    pub fn client_credentials_token(&self) -> Result<TokenSet> {
        self.transport.token_client_credentials()
    }

    /// Exchanges a refresh token for a fresh token set
    pub fn refresh_token(&self, refresh_token: &RefreshTokenRef) -> Result<TokenSet> {
        self.transport.token_refresh(refresh_token)
    }

    /// Ends the session behind the given refresh token
    pub fn logout(&self, refresh_token: &RefreshTokenRef) -> Result<()> {
        self.transport.logout(refresh_token)?;
        self.cache.invalidate_ops(&[CacheOp::UserInfo]);
        Ok(())
    }

    // ---- token inspection --------------------------------------------

    /// Whether the token is currently active; never served from cache
    pub fn validate_token(&self, token: &AccessTokenRef) -> Result<bool> {
        let doc = self.transport.introspect(token)?;
        Ok(doc.get("active").and_then(Value::as_bool).unwrap_or(false))
    }

    /// The raw introspection document for a token, never cached
    pub fn introspect_token(&self, token: &AccessTokenRef) -> Result<Value> {
        self.transport.introspect(token)
    }

    /// The claims granted to a token's bearer
    ///
    /// Validity is re-checked on every call; only the claim content is
    /// cached.
    pub fn get_userinfo(&self, token: &AccessTokenRef) -> Result<Arc<UserInfo>> {
        if !self.validate_token(token)? {
            return Err(Error::TokenExpired);
        }

        let key = CacheKey::new(CacheOp::UserInfo, &[&token_fingerprint(token.as_str())]);
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_userinfo) {
            return Ok(hit);
        }

        let info = Arc::new(self.transport.userinfo(token)?);
        self.cache.put(key, CacheValue::UserInfo(Arc::clone(&info)));
        Ok(info)
    }

    // ---- permissions and roles ---------------------------------------

    /// Asks the server whether the token's bearer holds a permission
    pub fn check_permissions(&self, token: &AccessTokenRef, permission: &str) -> Result<bool> {
        self.transport.uma_decision(token, permission)
    }

    /// Whether the token's bearer holds the named role, realm or client
    pub fn has_role(&self, token: &AccessTokenRef, role: &str) -> Result<bool> {
        Ok(self.subject_roles(token)?.contains(role))
    }

    /// Whether the token's bearer holds at least one of the named roles
    pub fn has_any_of_roles(&self, token: &AccessTokenRef, roles: &[&str]) -> Result<bool> {
        let held = self.subject_roles(token)?;
        Ok(roles.iter().any(|role| held.contains(*role)))
    }

    /// Whether the token's bearer holds every one of the named roles
    pub fn has_all_roles(&self, token: &AccessTokenRef, roles: &[&str]) -> Result<bool> {
        let held = self.subject_roles(token)?;
        Ok(roles.iter().all(|role| held.contains(*role)))
    }

    fn subject_roles(&self, token: &AccessTokenRef) -> Result<HashSet<String>> {
        let info = self.get_userinfo(token)?;

        let mut held: HashSet<String> = self
            .get_user_roles(&info.sub)?
            .iter()
            .map(|role| role.name.clone())
            .collect();

        if self.get_client(self.config.client_id())?.is_some() {
            held.extend(
                self.get_client_roles_for_user(&info.sub, self.config.client_id())?
                    .iter()
                    .map(|role| role.name.clone()),
            );
        }

        Ok(held)
    }

    // ---- users -------------------------------------------------------

    /// Fetches a user by id
    pub fn get_user_by_id(&self, user_id: &UserIdRef) -> Result<Option<Arc<UserRecord>>> {
        let key = CacheKey::new(CacheOp::UserById, &[user_id.as_str()]);
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_user) {
            return Ok(Some(hit));
        }

        let admin = self.session.access_token()?;
        match self.transport.get_user(&admin, user_id)? {
            Some(user) => {
                let user = Arc::new(user);
                self.cache.put(key, CacheValue::User(Arc::clone(&user)));
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Fetches a user by exact username
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<Arc<UserRecord>>> {
        let key = CacheKey::new(CacheOp::UserByUsername, &[username]);
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_user) {
            return Ok(Some(hit));
        }

        let admin = self.session.access_token()?;
        let mut users = self
            .transport
            .find_users(&admin, &UserQuery::by_username(username))?;
        if users.is_empty() {
            return Ok(None);
        }

        let user = Arc::new(users.swap_remove(0));
        self.cache.put(key, CacheValue::User(Arc::clone(&user)));
        Ok(Some(user))
    }

    /// Fetches a user by exact email
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<Arc<UserRecord>>> {
        let key = CacheKey::new(CacheOp::UserByEmail, &[email]);
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_user) {
            return Ok(Some(hit));
        }

        let admin = self.session.access_token()?;
        let mut users = self
            .transport
            .find_users(&admin, &UserQuery::by_email(email))?;
        if users.is_empty() {
            return Ok(None);
        }

        let user = Arc::new(users.swap_remove(0));
        self.cache.put(key, CacheValue::User(Arc::clone(&user)));
        Ok(Some(user))
    }

    /// Searches users by free text, bounded to `max` results
    pub fn search_users(&self, term: &str, max: u32) -> Result<Arc<Vec<UserRecord>>> {
        let key = CacheKey::new(CacheOp::SearchUsers, &[term, &max.to_string()]);
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_users) {
            return Ok(hit);
        }

        let admin = self.session.access_token()?;
        let users = Arc::new(
            self.transport
                .find_users(&admin, &UserQuery::search(term, max))?,
        );
        self.cache.put(key, CacheValue::Users(Arc::clone(&users)));
        Ok(users)
    }

    /// Creates a user from an admin representation and returns its id
    pub fn create_user(&self, representation: &Value) -> Result<UserId> {
        let admin = self.session.access_token()?;
        let id = self.transport.create_user(&admin, representation)?;
        self.cache.invalidate_ops(&[
            CacheOp::UserByUsername,
            CacheOp::UserByEmail,
            CacheOp::SearchUsers,
        ]);
        tracing::debug!(user = %id, "user created");
        Ok(id)
    }

    /// Applies a partial admin representation to a user
    pub fn update_user(&self, user_id: &UserIdRef, representation: &Value) -> Result<()> {
        let admin = self.session.access_token()?;
        self.transport.update_user(&admin, user_id, representation)?;
        self.cache.invalidate_user(user_id.as_str());
        Ok(())
    }

    /// Deletes a user
    pub fn delete_user(&self, user_id: &UserIdRef) -> Result<()> {
        let admin = self.session.access_token()?;
        self.transport.delete_user(&admin, user_id)?;
        self.cache.invalidate_user(user_id.as_str());
        self.cache.invalidate_user_roles(user_id.as_str());
        tracing::debug!(user = %user_id, "user deleted");
        Ok(())
    }

    /// Sets a user's password
    pub fn reset_password(
        &self,
        user_id: &UserIdRef,
        password: &str,
        temporary: bool,
    ) -> Result<()> {
        let admin = self.session.access_token()?;
        self.transport
            .reset_password(&admin, user_id, password, temporary)
    }

    /// Ends every session the user currently holds
    pub fn logout_user_sessions(&self, user_id: &UserIdRef) -> Result<()> {
        let admin = self.session.access_token()?;
        self.transport.logout_user(&admin, user_id)?;
        self.cache.invalidate_ops(&[CacheOp::UserInfo]);
        Ok(())
    }

    // ---- realm roles -------------------------------------------------

    /// Lists the realm's roles
    pub fn get_realm_roles(&self) -> Result<Arc<Vec<RoleRecord>>> {
        let key = CacheKey::nullary(CacheOp::RealmRoles);
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_roles) {
            return Ok(hit);
        }

        let admin = self.session.access_token()?;
        let roles = Arc::new(self.transport.realm_roles(&admin)?);
        self.cache.put(key, CacheValue::Roles(Arc::clone(&roles)));
        Ok(roles)
    }

    /// Fetches a realm role that is expected to exist
    pub fn get_realm_role(&self, name: &str) -> Result<Arc<RoleRecord>> {
        let key = CacheKey::new(CacheOp::RealmRole, &[name]);
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_role) {
            return Ok(hit);
        }

        let admin = self.session.access_token()?;
        let role = self
            .transport
            .realm_role(&admin, name)?
            .ok_or(Error::not_found(ResourceKind::Role))?;

        let role = Arc::new(role);
        self.cache.put(key, CacheValue::Role(Arc::clone(&role)));
        Ok(role)
    }

    /// Creates a realm role and returns the server's record of it
    pub fn create_realm_role(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Arc<RoleRecord>> {
        let admin = self.session.access_token()?;
        let representation = serde_json::json!({
            "name": name,
            "description": description,
        });
        self.transport.create_realm_role(&admin, &representation)?;

        self.cache.invalidate_ops(&[CacheOp::RealmRoles]);
        self.cache
            .invalidate_key(&CacheKey::new(CacheOp::RealmRole, &[name]));
        self.get_realm_role(name)
    }

    /// Deletes a realm role
    pub fn delete_realm_role(&self, name: &str) -> Result<()> {
        let admin = self.session.access_token()?;
        self.transport.delete_realm_role(&admin, name)?;

        self.cache
            .invalidate_ops(&[CacheOp::RealmRoles, CacheOp::UserRealmRoles]);
        self.cache
            .invalidate_key(&CacheKey::new(CacheOp::RealmRole, &[name]));
        Ok(())
    }

    /// Lists the realm roles mapped to a user
    pub fn get_user_roles(&self, user_id: &UserIdRef) -> Result<Arc<Vec<RoleRecord>>> {
        let key = CacheKey::new(CacheOp::UserRealmRoles, &[user_id.as_str()]);
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_roles) {
            return Ok(hit);
        }

        let admin = self.session.access_token()?;
        let roles = Arc::new(self.transport.user_realm_roles(&admin, user_id)?);
        self.cache.put(key, CacheValue::Roles(Arc::clone(&roles)));
        Ok(roles)
    }

    /// Maps a realm role onto a user
    pub fn assign_realm_role(&self, user_id: &UserIdRef, role_name: &str) -> Result<()> {
        let role = self.get_realm_role(role_name)?;
        let admin = self.session.access_token()?;
        self.transport
            .assign_realm_roles(&admin, user_id, std::slice::from_ref(&*role))?;
        self.cache.invalidate_user_roles(user_id.as_str());
        Ok(())
    }

    /// Removes a realm role mapping from a user
    pub fn remove_realm_role(&self, user_id: &UserIdRef, role_name: &str) -> Result<()> {
        let role = self.get_realm_role(role_name)?;
        let admin = self.session.access_token()?;
        self.transport
            .remove_realm_roles(&admin, user_id, std::slice::from_ref(&*role))?;
        self.cache.invalidate_user_roles(user_id.as_str());
        Ok(())
    }

    // ---- client roles ------------------------------------------------

    /// Lists the roles a user holds on one client
    pub fn get_client_roles_for_user(
        &self,
        user_id: &UserIdRef,
        client_id: &ClientIdRef,
    ) -> Result<Arc<Vec<RoleRecord>>> {
        let key = CacheKey::new(
            CacheOp::UserClientRoles,
            &[user_id.as_str(), client_id.as_str()],
        );
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_roles) {
            return Ok(hit);
        }

        let internal = self.client_internal_id(client_id)?;
        let admin = self.session.access_token()?;
        let roles = Arc::new(self.transport.user_client_roles(&admin, user_id, &internal)?);
        self.cache.put(key, CacheValue::Roles(Arc::clone(&roles)));
        Ok(roles)
    }

    /// Maps one of a client's roles onto a user
    pub fn assign_client_role(
        &self,
        user_id: &UserIdRef,
        client_id: &ClientIdRef,
        role_name: &str,
    ) -> Result<()> {
        let internal = self.client_internal_id(client_id)?;
        let admin = self.session.access_token()?;
        let role = self
            .transport
            .client_role(&admin, &internal, role_name)?
            .ok_or(Error::not_found(ResourceKind::Role))?;

        self.transport
            .assign_client_roles(&admin, user_id, &internal, std::slice::from_ref(&role))?;
        self.cache.invalidate_user_roles(user_id.as_str());
        Ok(())
    }

    /// Removes one of a client's role mappings from a user
    pub fn remove_client_role(
        &self,
        user_id: &UserIdRef,
        client_id: &ClientIdRef,
        role_name: &str,
    ) -> Result<()> {
        let internal = self.client_internal_id(client_id)?;
        let admin = self.session.access_token()?;
        let role = self
            .transport
            .client_role(&admin, &internal, role_name)?
            .ok_or(Error::not_found(ResourceKind::Role))?;

        self.transport
            .remove_client_roles(&admin, user_id, &internal, std::slice::from_ref(&role))?;
        self.cache.invalidate_user_roles(user_id.as_str());
        Ok(())
    }

    // ---- clients and server facts ------------------------------------

    /// Fetches a client by its public client identifier
    pub fn get_client(&self, client_id: &ClientIdRef) -> Result<Option<Arc<ClientRecord>>> {
        let key = CacheKey::new(CacheOp::Client, &[client_id.as_str()]);
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_client) {
            return Ok(Some(hit));
        }

        let admin = self.session.access_token()?;
        match self.transport.find_client(&admin, client_id)? {
            Some(client) => {
                let client = Arc::new(client);
                self.cache.put(key, CacheValue::Client(Arc::clone(&client)));
                Ok(Some(client))
            }
            None => Ok(None),
        }
    }

    /// The server-internal id of a client, as used in admin REST paths
    pub fn get_client_id(&self, client_id: &ClientIdRef) -> Result<Option<String>> {
        Ok(self
            .get_client(client_id)?
            .map(|client| client.id.clone()))
    }

    /// Fetches a confidential client's secret, when one is visible
    pub fn get_client_secret(&self, client_id: &ClientIdRef) -> Result<Option<ClientSecret>> {
        Ok(self
            .get_client(client_id)?
            .and_then(|client| client.secret.clone().map(ClientSecret::new)))
    }

    /// The id of the service-account user backing a client
    pub fn get_service_account_id(&self, client_id: &ClientIdRef) -> Result<UserId> {
        let key = CacheKey::new(CacheOp::ServiceAccountId, &[client_id.as_str()]);
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_text) {
            return Ok(UserId::new(hit.to_string()));
        }

        let internal = self.client_internal_id(client_id)?;
        let admin = self.session.access_token()?;
        let user = self.transport.service_account_user(&admin, &internal)?;

        self.cache
            .put(key, CacheValue::Text(Arc::from(user.id.as_str())));
        Ok(user.id)
    }

    /// The realm's token-signing public key, PEM-encoded
    pub fn get_public_key(&self) -> Result<Arc<str>> {
        let key = CacheKey::nullary(CacheOp::PublicKey);
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_text) {
            return Ok(hit);
        }

        let pem: Arc<str> = Arc::from(self.transport.realm_public_key()?);
        self.cache.put(key, CacheValue::Text(Arc::clone(&pem)));
        Ok(pem)
    }

    /// The realm's well-known OpenID configuration document
    pub fn get_well_known_config(&self) -> Result<Arc<Value>> {
        let key = CacheKey::nullary(CacheOp::WellKnown);
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_json) {
            return Ok(hit);
        }

        let doc = Arc::new(self.transport.well_known()?);
        self.cache.put(key, CacheValue::Json(Arc::clone(&doc)));
        Ok(doc)
    }

    /// The realm's JWKS document
    pub fn get_certs(&self) -> Result<Arc<Value>> {
        let key = CacheKey::nullary(CacheOp::Certs);
        if let Some(hit) = self.cache.get(&key).and_then(CacheValue::into_json) {
            return Ok(hit);
        }

        let doc = Arc::new(self.transport.certs()?);
        self.cache.put(key, CacheValue::Json(Arc::clone(&doc)));
        Ok(doc)
    }

    fn client_internal_id(&self, client_id: &ClientIdRef) -> Result<String> {
        let client = self
            .get_client(client_id)?
            .ok_or(Error::not_found(ResourceKind::Client))?;
        Ok(client.id.clone())
    }
}
