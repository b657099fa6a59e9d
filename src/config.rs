//! Adapter configuration
//!
//! Configuration is read once at construction through a validating builder
//! and is immutable for the adapter's lifetime.

use std::fmt;
use std::time::Duration;

use aliri_clock::DurationSecs;
use reqwest::Url;
use thiserror::Error;

use crate::backoff::RetryPolicy;
use crate::braids::{ClientId, ClientSecret};

/// An error raised while validating adapter configuration
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The server URL could not be parsed as an absolute HTTP(S) URL
    #[error("server URL is not a valid base URL: {0}")]
    InvalidServerUrl(String),
    /// The realm name was empty
    #[error("realm name must not be empty")]
    EmptyRealm,
    /// The client identifier was empty
    #[error("client id must not be empty")]
    EmptyClientId,
    /// The request timeout was zero
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
    /// Client-credentials administration requires a client secret
    #[error("client-credentials admin authentication requires a client secret")]
    MissingClientSecret,
}

/// Credentials used to establish the administrative session
#[derive(Clone)]
pub enum AdminCredentials {
    /// Authenticate as the service account of the configured client using
    /// the client-credentials grant
    ClientCredentials,
    /// Authenticate with the resource-owner password grant
    Password {
        /// The administrative username
        username: String,
        /// The administrative password
        password: String,
    },
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AdminCredentials::ClientCredentials => f.write_str("ClientCredentials"),
            AdminCredentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// Immutable configuration for one adapter instance
///
/// One configuration binds one adapter to one realm; the cache and the
/// administrative session are scoped accordingly.
#[derive(Clone, Debug)]
pub struct KeycloakConfig {
    server_url: Url,
    realm: String,
    client_id: ClientId,
    client_secret: Option<ClientSecret>,
    verify_tls: bool,
    request_timeout: Duration,
    admin: AdminCredentials,
    token_safety_margin: DurationSecs,
    retry: RetryPolicy,
}

impl KeycloakConfig {
    /// Starts building a configuration for the given server, realm, and client
    pub fn builder(
        server_url: impl Into<String>,
        realm: impl Into<String>,
        client_id: ClientId,
    ) -> KeycloakConfigBuilder {
        KeycloakConfigBuilder {
            server_url: server_url.into(),
            realm: realm.into(),
            client_id,
            client_secret: None,
            verify_tls: true,
            request_timeout: Duration::from_secs(30),
            admin: AdminCredentials::ClientCredentials,
            token_safety_margin: DurationSecs(30),
            retry: RetryPolicy::default(),
        }
    }

    /// The base URL of the authorization server
    pub fn server_url(&self) -> &Url {
        &self.server_url
    }

    /// The realm this adapter is bound to
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// The configured client identifier
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// The configured client secret, if any
    pub fn client_secret(&self) -> Option<&ClientSecret> {
        self.client_secret.as_ref()
    }

    /// Whether TLS certificates are verified
    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    /// The per-request timeout
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// The credentials used for the administrative session
    pub fn admin_credentials(&self) -> &AdminCredentials {
        &self.admin
    }

    /// How long before actual expiry the admin token is refreshed
    pub fn token_safety_margin(&self) -> DurationSecs {
        self.token_safety_margin
    }

    /// The retry policy applied to transient admin-session failures
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }
}

/// Builder for [`KeycloakConfig`]
#[derive(Debug)]
pub struct KeycloakConfigBuilder {
    server_url: String,
    realm: String,
    client_id: ClientId,
    client_secret: Option<ClientSecret>,
    verify_tls: bool,
    request_timeout: Duration,
    admin: AdminCredentials,
    token_safety_margin: DurationSecs,
    retry: RetryPolicy,
}

impl KeycloakConfigBuilder {
    /// Sets the client secret
    pub fn client_secret(mut self, secret: ClientSecret) -> Self {
        self.client_secret = Some(secret);
        self
    }

    /// Disables or enables TLS certificate verification (enabled by default)
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Sets the per-request timeout (30 seconds by default)
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Uses the resource-owner password grant for the administrative session
    /// instead of the default client-credentials grant
    pub fn admin_password(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.admin = AdminCredentials::Password {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Sets how long before actual expiry the admin token is refreshed
    /// (30 seconds by default)
    ///
    /// The margin must be large enough to absorb one round-trip so that a
    /// token handed out just before the deadline does not expire mid-use.
    pub fn token_safety_margin(mut self, margin: DurationSecs) -> Self {
        self.token_safety_margin = margin;
        self
    }

    /// Sets the retry policy for transient admin-session failures
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Validates the configuration and builds it
    pub fn build(self) -> Result<KeycloakConfig, ConfigError> {
        let server_url = Url::parse(&self.server_url)
            .map_err(|_| ConfigError::InvalidServerUrl(self.server_url.clone()))?;
        if !matches!(server_url.scheme(), "http" | "https") || server_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidServerUrl(self.server_url));
        }
        if self.realm.is_empty() {
            return Err(ConfigError::EmptyRealm);
        }
        if self.client_id.as_str().is_empty() {
            return Err(ConfigError::EmptyClientId);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if matches!(self.admin, AdminCredentials::ClientCredentials) && self.client_secret.is_none()
        {
            return Err(ConfigError::MissingClientSecret);
        }

        Ok(KeycloakConfig {
            server_url,
            realm: self.realm,
            client_id: self.client_id,
            client_secret: self.client_secret,
            verify_tls: self.verify_tls,
            request_timeout: self.request_timeout,
            admin: self.admin,
            token_safety_margin: self.token_safety_margin,
            retry: self.retry,
        })
    }
}
