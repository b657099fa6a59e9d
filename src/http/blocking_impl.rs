//! Blocking reqwest transport
//!
//! A line-for-line mirror of the non-blocking transport over
//! [`reqwest::blocking::Client`]. Behavioral changes must land in both.

use aliri_clock::System;
use reqwest::blocking::Response;
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::braids::{AccessTokenRef, ClientId, ClientIdRef, ClientSecret, RefreshTokenRef, UserId, UserIdRef};
use crate::config::KeycloakConfig;
use crate::errors::{Error, ResourceKind, Result};
use crate::records::{ClientRecord, RoleRecord, UserInfo, UserRecord};
use crate::tokens::TokenSet;
use crate::transport::{BlockingKeycloakTransport, UserQuery};

use super::dto::{
    AuthorizationCodeGrant, ClientCredentialsGrant, CredentialRepresentation, DecisionResponse,
    IntrospectRequest, LogoutRequest, PasswordGrant, RealmDocument, RefreshGrant, TokenResponse,
    UmaDecisionRequest,
};
use super::{classify_status, classify_token_status, pem_wrap_public_key, Endpoints};

const USER_AGENT: &str = concat!("keycloak-adapter/", env!("CARGO_PKG_VERSION"));

/// The bundled blocking transport, backed by [`reqwest::blocking::Client`]
#[derive(Clone, Debug)]
pub struct BlockingHttpTransport {
    http: reqwest::blocking::Client,
    endpoints: Endpoints,
    client_id: ClientId,
    client_secret: Option<ClientSecret>,
}

impl BlockingHttpTransport {
    /// Constructs a transport from the adapter configuration
    pub fn new(config: &KeycloakConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(!config.verify_tls())
            .build()
            .map_err(Error::unavailable)?;

        Ok(Self {
            http,
            endpoints: Endpoints::new(config.server_url(), config.realm()),
            client_id: config.client_id().clone(),
            client_secret: config.client_secret().cloned(),
        })
    }

    fn secret(&self) -> Option<&str> {
        self.client_secret.as_ref().map(|s| s.as_str())
    }

    fn token_request<F: Serialize + ?Sized>(&self, form: &F) -> Result<TokenSet> {
        let response = self
            .http
            .post(self.endpoints.token())
            .form(form)
            .send()
            .map_err(Error::unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_token_status(status, &body));
        }

        let token: TokenResponse = response.json().map_err(Error::unavailable)?;
        Ok(token.into_token_set(&System))
    }

    fn reject(response: Response, operation: &str, kind: ResourceKind) -> Error {
        let status = response.status();
        let body = response.text().unwrap_or_default();
        classify_status(status, operation, kind, &body)
    }

    fn admin_get<T: DeserializeOwned>(
        &self,
        admin: &AccessTokenRef,
        tail: &str,
        operation: &str,
        kind: ResourceKind,
    ) -> Result<T> {
        let response = self
            .http
            .get(self.endpoints.admin(tail))
            .bearer_auth(admin.as_str())
            .send()
            .map_err(Error::unavailable)?;

        if !response.status().is_success() {
            return Err(Self::reject(response, operation, kind));
        }
        response.json().map_err(Error::unavailable)
    }

    /// As [`Self::admin_get`], but a 404 is expressed as absence
    fn admin_lookup<T: DeserializeOwned>(
        &self,
        admin: &AccessTokenRef,
        tail: &str,
        operation: &str,
        kind: ResourceKind,
    ) -> Result<Option<T>> {
        let response = self
            .http
            .get(self.endpoints.admin(tail))
            .bearer_auth(admin.as_str())
            .send()
            .map_err(Error::unavailable)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::reject(response, operation, kind));
        }
        response.json().map(Some).map_err(Error::unavailable)
    }

    fn admin_write<B: Serialize + ?Sized>(
        &self,
        admin: &AccessTokenRef,
        method: reqwest::Method,
        tail: &str,
        body: Option<&B>,
        operation: &str,
        kind: ResourceKind,
    ) -> Result<Response> {
        let mut request = self
            .http
            .request(method, self.endpoints.admin(tail))
            .bearer_auth(admin.as_str());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().map_err(Error::unavailable)?;

        if !response.status().is_success() {
            return Err(Self::reject(response, operation, kind));
        }
        Ok(response)
    }
}

impl BlockingKeycloakTransport for BlockingHttpTransport {
    fn token_password_grant(&self, username: &str, password: &str) -> Result<TokenSet> {
        self.token_request(&PasswordGrant {
            grant_type: "password",
            client_id: self.client_id.as_str(),
            client_secret: self.secret(),
            username,
            password,
        })
    }

    fn token_client_credentials(&self) -> Result<TokenSet> {
        self.token_request(&ClientCredentialsGrant {
            grant_type: "client_credentials",
            client_id: self.client_id.as_str(),
            client_secret: self.secret(),
        })
    }

    fn token_authorization_code(&self, code: &str, redirect_uri: &str) -> Result<TokenSet> {
        self.token_request(&AuthorizationCodeGrant {
            grant_type: "authorization_code",
            client_id: self.client_id.as_str(),
            client_secret: self.secret(),
            code,
            redirect_uri,
        })
    }

    fn token_refresh(&self, refresh_token: &RefreshTokenRef) -> Result<TokenSet> {
        self.token_request(&RefreshGrant {
            grant_type: "refresh_token",
            client_id: self.client_id.as_str(),
            client_secret: self.secret(),
            refresh_token: refresh_token.as_str(),
        })
    }

    fn logout(&self, refresh_token: &RefreshTokenRef) -> Result<()> {
        let response = self
            .http
            .post(self.endpoints.logout())
            .form(&LogoutRequest {
                client_id: self.client_id.as_str(),
                client_secret: self.secret(),
                refresh_token: refresh_token.as_str(),
            })
            .send()
            .map_err(Error::unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_token_status(status, &body));
        }
        Ok(())
    }

    fn introspect(&self, token: &AccessTokenRef) -> Result<Value> {
        let response = self
            .http
            .post(self.endpoints.introspect())
            .form(&IntrospectRequest {
                client_id: self.client_id.as_str(),
                client_secret: self.secret(),
                token: token.as_str(),
            })
            .send()
            .map_err(Error::unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_token_status(status, &body));
        }
        response.json().map_err(Error::unavailable)
    }

    fn userinfo(&self, token: &AccessTokenRef) -> Result<UserInfo> {
        let response = self
            .http
            .get(self.endpoints.userinfo())
            .bearer_auth(token.as_str())
            .send()
            .map_err(Error::unavailable)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::TokenExpired);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_status(status, "fetch userinfo", ResourceKind::User, &body));
        }
        response.json().map_err(Error::unavailable)
    }

    fn uma_decision(&self, token: &AccessTokenRef, permission: &str) -> Result<bool> {
        let response = self
            .http
            .post(self.endpoints.token())
            .bearer_auth(token.as_str())
            .form(&UmaDecisionRequest {
                grant_type: "urn:ietf:params:oauth:grant-type:uma-ticket",
                audience: self.client_id.as_str(),
                permission,
                response_mode: "decision",
            })
            .send()
            .map_err(Error::unavailable)?;

        let status = response.status();
        // a denied permission comes back as 403, not as an error condition
        if status == StatusCode::FORBIDDEN {
            return Ok(false);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_token_status(status, &body));
        }

        let decision: DecisionResponse = response.json().map_err(Error::unavailable)?;
        Ok(decision.result)
    }

    fn realm_public_key(&self) -> Result<String> {
        let response = self
            .http
            .get(self.endpoints.realm_document())
            .send()
            .map_err(Error::unavailable)?;

        if !response.status().is_success() {
            return Err(Self::reject(response, "fetch realm document", ResourceKind::Client));
        }
        let doc: RealmDocument = response.json().map_err(Error::unavailable)?;
        Ok(pem_wrap_public_key(&doc.public_key))
    }

    fn well_known(&self) -> Result<Value> {
        let response = self
            .http
            .get(self.endpoints.well_known())
            .send()
            .map_err(Error::unavailable)?;

        if !response.status().is_success() {
            return Err(Self::reject(
                response,
                "fetch openid configuration",
                ResourceKind::Client,
            ));
        }
        response.json().map_err(Error::unavailable)
    }

    fn certs(&self) -> Result<Value> {
        let response = self
            .http
            .get(self.endpoints.certs())
            .send()
            .map_err(Error::unavailable)?;

        if !response.status().is_success() {
            return Err(Self::reject(response, "fetch signing keys", ResourceKind::Client));
        }
        response.json().map_err(Error::unavailable)
    }

    fn get_user(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
    ) -> Result<Option<UserRecord>> {
        self.admin_lookup(
            admin,
            &format!("users/{user_id}"),
            "fetch user",
            ResourceKind::User,
        )
    }

    fn find_users(&self, admin: &AccessTokenRef, query: &UserQuery) -> Result<Vec<UserRecord>> {
        let response = self
            .http
            .get(self.endpoints.admin("users"))
            .query(query)
            .bearer_auth(admin.as_str())
            .send()
            .map_err(Error::unavailable)?;

        if !response.status().is_success() {
            return Err(Self::reject(response, "search users", ResourceKind::User));
        }
        response.json().map_err(Error::unavailable)
    }

    fn create_user(&self, admin: &AccessTokenRef, representation: &Value) -> Result<UserId> {
        let response = self.admin_write(
            admin,
            reqwest::Method::POST,
            "users",
            Some(representation),
            "create user",
            ResourceKind::User,
        )?;

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::unavailable("user created without a Location header"))?;
        let id = location.rsplit('/').next().unwrap_or_default();
        if id.is_empty() {
            return Err(Error::unavailable("user created with an empty identifier"));
        }
        Ok(UserId::new(id.to_owned()))
    }

    fn update_user(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        representation: &Value,
    ) -> Result<()> {
        self.admin_write(
            admin,
            reqwest::Method::PUT,
            &format!("users/{user_id}"),
            Some(representation),
            "update user",
            ResourceKind::User,
        )
        .map(drop)
    }

    fn delete_user(&self, admin: &AccessTokenRef, user_id: &UserIdRef) -> Result<()> {
        self.admin_write::<Value>(
            admin,
            reqwest::Method::DELETE,
            &format!("users/{user_id}"),
            None,
            "delete user",
            ResourceKind::User,
        )
        .map(drop)
    }

    fn reset_password(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        password: &str,
        temporary: bool,
    ) -> Result<()> {
        self.admin_write(
            admin,
            reqwest::Method::PUT,
            &format!("users/{user_id}/reset-password"),
            Some(&CredentialRepresentation {
                kind: "password",
                value: password,
                temporary,
            }),
            "reset password",
            ResourceKind::User,
        )
        .map(drop)
    }

    fn logout_user(&self, admin: &AccessTokenRef, user_id: &UserIdRef) -> Result<()> {
        self.admin_write::<Value>(
            admin,
            reqwest::Method::POST,
            &format!("users/{user_id}/logout"),
            None,
            "end user sessions",
            ResourceKind::User,
        )
        .map(drop)
    }

    fn realm_roles(&self, admin: &AccessTokenRef) -> Result<Vec<RoleRecord>> {
        self.admin_get(admin, "roles", "list realm roles", ResourceKind::Role)
    }

    fn realm_role(&self, admin: &AccessTokenRef, name: &str) -> Result<Option<RoleRecord>> {
        self.admin_lookup(
            admin,
            &format!("roles/{name}"),
            "fetch realm role",
            ResourceKind::Role,
        )
    }

    fn create_realm_role(&self, admin: &AccessTokenRef, representation: &Value) -> Result<()> {
        self.admin_write(
            admin,
            reqwest::Method::POST,
            "roles",
            Some(representation),
            "create realm role",
            ResourceKind::Role,
        )
        .map(drop)
    }

    fn delete_realm_role(&self, admin: &AccessTokenRef, name: &str) -> Result<()> {
        self.admin_write::<Value>(
            admin,
            reqwest::Method::DELETE,
            &format!("roles/{name}"),
            None,
            "delete realm role",
            ResourceKind::Role,
        )
        .map(drop)
    }

    fn user_realm_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
    ) -> Result<Vec<RoleRecord>> {
        self.admin_get(
            admin,
            &format!("users/{user_id}/role-mappings/realm"),
            "list user realm roles",
            ResourceKind::User,
        )
    }

    fn assign_realm_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        roles: &[RoleRecord],
    ) -> Result<()> {
        self.admin_write(
            admin,
            reqwest::Method::POST,
            &format!("users/{user_id}/role-mappings/realm"),
            Some(roles),
            "assign realm roles",
            ResourceKind::User,
        )
        .map(drop)
    }

    fn remove_realm_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        roles: &[RoleRecord],
    ) -> Result<()> {
        self.admin_write(
            admin,
            reqwest::Method::DELETE,
            &format!("users/{user_id}/role-mappings/realm"),
            Some(roles),
            "remove realm roles",
            ResourceKind::User,
        )
        .map(drop)
    }

    fn user_client_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
    ) -> Result<Vec<RoleRecord>> {
        self.admin_get(
            admin,
            &format!("users/{user_id}/role-mappings/clients/{client_internal_id}"),
            "list user client roles",
            ResourceKind::User,
        )
    }

    fn client_role(
        &self,
        admin: &AccessTokenRef,
        client_internal_id: &str,
        name: &str,
    ) -> Result<Option<RoleRecord>> {
        self.admin_lookup(
            admin,
            &format!("clients/{client_internal_id}/roles/{name}"),
            "fetch client role",
            ResourceKind::Role,
        )
    }

    fn assign_client_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
        roles: &[RoleRecord],
    ) -> Result<()> {
        self.admin_write(
            admin,
            reqwest::Method::POST,
            &format!("users/{user_id}/role-mappings/clients/{client_internal_id}"),
            Some(roles),
            "assign client roles",
            ResourceKind::User,
        )
        .map(drop)
    }

    fn remove_client_roles(
        &self,
        admin: &AccessTokenRef,
        user_id: &UserIdRef,
        client_internal_id: &str,
        roles: &[RoleRecord],
    ) -> Result<()> {
        self.admin_write(
            admin,
            reqwest::Method::DELETE,
            &format!("users/{user_id}/role-mappings/clients/{client_internal_id}"),
            Some(roles),
            "remove client roles",
            ResourceKind::User,
        )
        .map(drop)
    }

    fn find_client(
        &self,
        admin: &AccessTokenRef,
        client_id: &ClientIdRef,
    ) -> Result<Option<ClientRecord>> {
        let response = self
            .http
            .get(self.endpoints.admin("clients"))
            .query(&[("clientId", client_id.as_str())])
            .bearer_auth(admin.as_str())
            .send()
            .map_err(Error::unavailable)?;

        if !response.status().is_success() {
            return Err(Self::reject(response, "fetch client", ResourceKind::Client));
        }
        let mut clients: Vec<ClientRecord> = response.json().map_err(Error::unavailable)?;
        Ok(if clients.is_empty() {
            None
        } else {
            Some(clients.swap_remove(0))
        })
    }

    fn service_account_user(
        &self,
        admin: &AccessTokenRef,
        client_internal_id: &str,
    ) -> Result<UserRecord> {
        self.admin_get(
            admin,
            &format!("clients/{client_internal_id}/service-account-user"),
            "fetch service account",
            ResourceKind::Client,
        )
    }
}
