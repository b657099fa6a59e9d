//! The wire seam between the adapter and the authorization server
//!
//! Implementations own the HTTP machinery; the adapter supplies
//! credentials and interprets results. The bundled reqwest-backed
//! implementations live in [`crate::http`]; tests substitute in-memory
//! fakes.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::braids::{AccessTokenRef, ClientIdRef, RefreshTokenRef, UserId, UserIdRef};
use crate::errors::Result;
use crate::records::{ClientRecord, RoleRecord, UserInfo, UserRecord};
use crate::tokens::TokenSet;

fn is_false(v: &bool) -> bool {
    !*v
}

/// A field-targeted query against the admin user listing
#[derive(Clone, Debug, Default, Serialize)]
pub struct UserQuery {
    /// Free-text search across username, name, and email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Match on username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Match on email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Match on first name
    #[serde(rename = "firstName", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Match on last name
    #[serde(rename = "lastName", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Maximum number of results to return
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    /// Require exact matches rather than infix matches
    #[serde(skip_serializing_if = "is_false")]
    pub exact: bool,
}

impl UserQuery {
    /// An exact-match query on username
    pub fn by_username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            exact: true,
            max: Some(2),
            ..Self::default()
        }
    }

    /// An exact-match query on email
    pub fn by_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            exact: true,
            max: Some(2),
            ..Self::default()
        }
    }

    /// A free-text search bounded to `max` results
    pub fn search(term: impl Into<String>, max: u32) -> Self {
        Self {
            search: Some(term.into()),
            max: Some(max),
            ..Self::default()
        }
    }
}

/// Non-blocking wire client for the authorization server
///
/// Methods that take an `admin` token hit the admin REST surface; the rest
/// hit the realm's OIDC endpoints. Each call maps the server's response
/// into the crate's error taxonomy; lookups express absence as `Ok(None)`.
#[async_trait]
pub trait KeycloakTransport: Send + Sync {
    /// Exchanges resource-owner credentials for tokens
    async fn token_password_grant(&self, username: &str, password: &str) -> Result<TokenSet>;

    /// Exchanges the configured client credentials for tokens
    async fn token_client_credentials(&self) -> Result<TokenSet>;

    /// Exchanges an authorization code for tokens
    async fn token_authorization_code(&self, code: &str, redirect_uri: &str) -> Result<TokenSet>;

    /// Exchanges a refresh token for fresh tokens
    async fn token_refresh(&self, refresh_token: &RefreshTokenRef) -> Result<TokenSet>;

    /// Invalidates a refresh token, ending the session it belongs to
    async fn logout(&self, refresh_token: &RefreshTokenRef) -> Result<()>;

    /// Introspects a token, returning the raw introspection document
    async fn introspect(&self, token: &AccessTokenRef) -> Result<Value>;

    /// Fetches the claims the token grants access to
    async fn userinfo(&self, token: &AccessTokenRef) -> Result<UserInfo>;

    /// Asks the policy-enforcement endpoint for a permission decision
    async fn uma_decision(&self, token: &AccessTokenRef, permission: &str) -> Result<bool>;

    /// Fetches the realm's token-signing public key, PEM-encoded
    async fn realm_public_key(&self) -> Result<String>;

    /// Fetches the realm's well-known OpenID configuration
    async fn well_known(&self) -> Result<Value>;

    /// Fetches the realm's JWKS document
    async fn certs(&self) -> Result<Value>;

    /// Fetches one user by id
    async fn get_user(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
    ) -> Result<Option<UserRecord>>;

    /// Lists users matching a query
    async fn find_users(&self, admin: &AccessTokenRef, query: &UserQuery)
        -> Result<Vec<UserRecord>>;

    /// Creates a user and returns the id the server assigned
    async fn create_user(&self, admin: &AccessTokenRef, representation: &Value) -> Result<UserId>;

    /// Updates a user's representation
    async fn update_user(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        representation: &Value,
    ) -> Result<()>;

    /// Deletes a user
    async fn delete_user(&self, admin: &AccessTokenRef, user_id: &UserIdRef) -> Result<()>;

    /// Sets a user's password
    async fn reset_password(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        password: &str,
        temporary: bool,
    ) -> Result<()>;

    /// Ends all of a user's sessions
    async fn logout_user(&self, admin: &AccessTokenRef, user_id: &UserIdRef) -> Result<()>;

    /// Lists the realm's roles
    async fn realm_roles(&self, admin: &AccessTokenRef) -> Result<Vec<RoleRecord>>;

    /// Fetches one realm role by name
    async fn realm_role(&self, admin: &AccessTokenRef, name: &str) -> Result<Option<RoleRecord>>;

    /// Creates a realm role
    async fn create_realm_role(&self, admin: &AccessTokenRef, representation: &Value)
        -> Result<()>;

    /// Deletes a realm role
    async fn delete_realm_role(&self, admin: &AccessTokenRef, name: &str) -> Result<()>;

    /// Lists the realm roles mapped to a user
    async fn user_realm_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
    ) -> Result<Vec<RoleRecord>>;

    /// Adds realm-role mappings to a user
    async fn assign_realm_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        roles: &[RoleRecord],
    ) -> Result<()>;

    /// Removes realm-role mappings from a user
    async fn remove_realm_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        roles: &[RoleRecord],
    ) -> Result<()>;

    /// Lists the client-role mappings a user holds for one client
    async fn user_client_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
    ) -> Result<Vec<RoleRecord>>;

    /// Fetches one of a client's roles by name
    async fn client_role(
        &self,
        admin: &AccessTokenRef,
        client_internal_id: &str,
        name: &str,
    ) -> Result<Option<RoleRecord>>;

    /// Adds client-role mappings to a user
    async fn assign_client_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
        roles: &[RoleRecord],
    ) -> Result<()>;

    /// Removes client-role mappings from a user
    async fn remove_client_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
        roles: &[RoleRecord],
    ) -> Result<()>;

    /// Fetches a client representation by its public client identifier
    async fn find_client(
        &self,
        admin: &AccessTokenRef,
        client_id: &ClientIdRef,
    ) -> Result<Option<ClientRecord>>;

    /// Fetches the service-account user backing a client
    async fn service_account_user(
        &self,
        admin: &AccessTokenRef,
        client_internal_id: &str,
    ) -> Result<UserRecord>;
}

/// Blocking wire client for the authorization server
///
/// The blocking mirror of [`KeycloakTransport`]: identical methods,
/// identical semantics, with each call blocking the calling thread until
/// the round-trip completes.
pub trait BlockingKeycloakTransport: Send + Sync {
    /// Exchanges resource-owner credentials for tokens
    fn token_password_grant(&self, username: &str, password: &str) -> Result<TokenSet>;

    /// Exchanges the configured client credentials for tokens
    fn token_client_credentials(&self) -> Result<TokenSet>;

    /// Exchanges an authorization code for tokens
    fn token_authorization_code(&self, code: &str, redirect_uri: &str) -> Result<TokenSet>;

    /// Exchanges a refresh token for fresh tokens
    fn token_refresh(&self, refresh_token: &RefreshTokenRef) -> Result<TokenSet>;

    /// Invalidates a refresh token, ending the session it belongs to
    fn logout(&self, refresh_token: &RefreshTokenRef) -> Result<()>;

    /// Introspects a token, returning the raw introspection document
    fn introspect(&self, token: &AccessTokenRef) -> Result<Value>;

    /// Fetches the claims the token grants access to
    fn userinfo(&self, token: &AccessTokenRef) -> Result<UserInfo>;

    /// Asks the policy-enforcement endpoint for a permission decision
    fn uma_decision(&self, token: &AccessTokenRef, permission: &str) -> Result<bool>;

    /// Fetches the realm's token-signing public key, PEM-encoded
    fn realm_public_key(&self) -> Result<String>;

    /// Fetches the realm's well-known OpenID configuration
    fn well_known(&self) -> Result<Value>;

    /// Fetches the realm's JWKS document
    fn certs(&self) -> Result<Value>;

    /// Fetches one user by id
    fn get_user(&self, admin: &AccessTokenRef, user_id: &UserIdRef)
        -> Result<Option<UserRecord>>;

    /// Lists users matching a query
    fn find_users(&self, admin: &AccessTokenRef, query: &UserQuery) -> Result<Vec<UserRecord>>;

    /// Creates a user and returns the id the server assigned
    fn create_user(&self, admin: &AccessTokenRef, representation: &Value) -> Result<UserId>;

    /// Updates a user's representation
    fn update_user(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        representation: &Value,
    ) -> Result<()>;

    /// Deletes a user
    fn delete_user(&self, admin: &AccessTokenRef, user_id: &UserIdRef) -> Result<()>;

    /// Sets a user's password
    fn reset_password(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        password: &str,
        temporary: bool,
    ) -> Result<()>;

    /// Ends all of a user's sessions
    fn logout_user(&self, admin: &AccessTokenRef, user_id: &UserIdRef) -> Result<()>;

    /// Lists the realm's roles
    fn realm_roles(&self, admin: &AccessTokenRef) -> Result<Vec<RoleRecord>>;

    /// Fetches one realm role by name
    fn realm_role(&self, admin: &AccessTokenRef, name: &str) -> Result<Option<RoleRecord>>;

    /// Creates a realm role
    fn create_realm_role(&self, admin: &AccessTokenRef, representation: &Value) -> Result<()>;

    /// Deletes a realm role
    fn delete_realm_role(&self, admin: &AccessTokenRef, name: &str) -> Result<()>;

    /// Lists the realm roles mapped to a user
    fn user_realm_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
    ) -> Result<Vec<RoleRecord>>;

    /// Adds realm-role mappings to a user
    fn assign_realm_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        roles: &[RoleRecord],
    ) -> Result<()>;

    /// Removes realm-role mappings from a user
    fn remove_realm_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        roles: &[RoleRecord],
    ) -> Result<()>;

    /// Lists the client-role mappings a user holds for one client
    fn user_client_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
    ) -> Result<Vec<RoleRecord>>;

    /// Fetches one of a client's roles by name
    fn client_role(
        &self,
        admin: &AccessTokenRef,
        client_internal_id: &str,
        name: &str,
    ) -> Result<Option<RoleRecord>>;

    /// Adds client-role mappings to a user
    fn assign_client_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
        roles: &[RoleRecord],
    ) -> Result<()>;

    /// Removes client-role mappings from a user
    fn remove_client_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
        roles: &[RoleRecord],
    ) -> Result<()>;

    /// Fetches a client representation by its public client identifier
    fn find_client(
        &self,
        admin: &AccessTokenRef,
        client_id: &ClientIdRef,
    ) -> Result<Option<ClientRecord>>;

    /// Fetches the service-account user backing a client
    fn service_account_user(
        &self,
        admin: &AccessTokenRef,
        client_internal_id: &str,
    ) -> Result<UserRecord>;
}
