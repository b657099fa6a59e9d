//! The managed administrative session
//!
//! Every privileged operation borrows its token from a manager here. The
//! manager establishes the session lazily, refreshes it ahead of expiry,
//! and serializes refreshes so concurrent callers produce at most one
//! token-endpoint round trip.

use std::future::Future;
use std::sync::Arc;

use aliri_clock::{Clock, System};

use crate::braids::AccessToken;
use crate::config::{AdminCredentials, KeycloakConfig};
use crate::errors::{Error, Result};
use crate::tokens::{AdminSession, TokenSet};
use crate::transport::{BlockingKeycloakTransport, KeycloakTransport};

/// Serializes access to the administrative session for the async adapter
///
/// The session lives behind one async mutex. A caller that finds the
/// session missing or past its refresh deadline re-establishes it while
/// holding the lock, so every other caller waits for that one outcome
/// instead of racing the token endpoint.
#[derive(Debug)]
pub(crate) struct AdminTokenManager<T, C = System> {
    transport: Arc<T>,
    config: Arc<KeycloakConfig>,
    clock: C,
    session: tokio::sync::Mutex<Option<AdminSession>>,
}

impl<T, C> AdminTokenManager<T, C>
where
    T: KeycloakTransport,
    C: Clock,
{
    pub(crate) fn new(transport: Arc<T>, config: Arc<KeycloakConfig>, clock: C) -> Self {
        Self {
            transport,
            config,
            clock,
            session: tokio::sync::Mutex::new(None),
        }
    }

    /// Returns an admin access token good for at least the safety margin
    pub(crate) async fn access_token(&self) -> Result<AccessToken> {
        let mut guard = self.session.lock().await;

        // another caller may have refreshed while this one waited
        let now = self.clock.now();
        if let Some(session) = guard.as_ref() {
            if !session.needs_refresh(now) {
                return Ok(session.tokens().access_token().to_owned());
            }
        }

        let session = self.establish(guard.as_ref()).await?;
        let token = session.tokens().access_token().to_owned();
        // the previous session is only replaced once establishment succeeds
        *guard = Some(session);
        Ok(token)
    }

    async fn establish(&self, current: Option<&AdminSession>) -> Result<AdminSession> {
        if let Some(refresh_token) = current.and_then(|s| s.tokens().refresh_token()) {
            match self
                .with_retries(|| self.transport.token_refresh(refresh_token))
                .await
            {
                Ok(tokens) => return Ok(self.stamp(tokens)),
                Err(Error::Authentication { .. }) | Err(Error::TokenExpired) => {
                    tracing::warn!("admin refresh token rejected, re-authenticating");
                }
                Err(err) => return Err(err),
            }
        }

        let tokens = self.with_retries(|| self.authenticate()).await?;
        tracing::debug!("administrative session established");
        Ok(self.stamp(tokens))
    }

    async fn authenticate(&self) -> Result<TokenSet> {
        match self.config.admin_credentials() {
            AdminCredentials::ClientCredentials => {
                self.transport.token_client_credentials().await
            }
            AdminCredentials::Password { username, password } => {
                self.transport.token_password_grant(username, password).await
            }
        }
    }

    fn stamp(&self, tokens: TokenSet) -> AdminSession {
        AdminSession::new(tokens, self.config.token_safety_margin())
    }

    async fn with_retries<F, Fut, O>(&self, mut op: F) -> Result<O>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<O>>,
    {
        let mut backoff = self.config.retry_policy().backoff();
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => match backoff.next_delay() {
                    Some(delay) => {
                        tracing::warn!(
                            delay_ms = delay.as_millis() as u64,
                            "transient failure establishing admin session, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(err),
                },
                Err(err) => return Err(err),
            }
        }
    }
}

/// The blocking counterpart of [`AdminTokenManager`]
///
/// Identical session discipline over a standard mutex; a poisoned lock is
/// recovered rather than propagated since the session state is replaced
/// wholesale on every write.
#[derive(Debug)]
pub(crate) struct BlockingAdminTokenManager<T, C = System> {
    transport: Arc<T>,
    config: Arc<KeycloakConfig>,
    clock: C,
    session: std::sync::Mutex<Option<AdminSession>>,
}

impl<T, C> BlockingAdminTokenManager<T, C>
where
    T: BlockingKeycloakTransport,
    C: Clock,
{
    pub(crate) fn new(transport: Arc<T>, config: Arc<KeycloakConfig>, clock: C) -> Self {
        Self {
            transport,
            config,
            clock,
            session: std::sync::Mutex::new(None),
        }
    }

    /// Returns an admin access token good for at least the safety margin
    pub(crate) fn access_token(&self) -> Result<AccessToken> {
        let mut guard = self
            .session
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let now = self.clock.now();
        if let Some(session) = guard.as_ref() {
            if !session.needs_refresh(now) {
                return Ok(session.tokens().access_token().to_owned());
            }
        }

        let session = self.establish(guard.as_ref())?;
        let token = session.tokens().access_token().to_owned();
        *guard = Some(session);
        Ok(token)
    }

    fn establish(&self, current: Option<&AdminSession>) -> Result<AdminSession> {
        if let Some(refresh_token) = current.and_then(|s| s.tokens().refresh_token()) {
            match self.with_retries(|| self.transport.token_refresh(refresh_token)) {
                Ok(tokens) => return Ok(self.stamp(tokens)),
                Err(Error::Authentication { .. }) | Err(Error::TokenExpired) => {
                    tracing::warn!("admin refresh token rejected, re-authenticating");
                }
                Err(err) => return Err(err),
            }
        }

        let tokens = self.with_retries(|| self.authenticate())?;
        tracing::debug!("administrative session established");
        Ok(self.stamp(tokens))
    }

    fn authenticate(&self) -> Result<TokenSet> {
        match self.config.admin_credentials() {
            AdminCredentials::ClientCredentials => self.transport.token_client_credentials(),
            AdminCredentials::Password { username, password } => {
                self.transport.token_password_grant(username, password)
            }
        }
    }

    fn stamp(&self, tokens: TokenSet) -> AdminSession {
        AdminSession::new(tokens, self.config.token_safety_margin())
    }

    fn with_retries<F, O>(&self, mut op: F) -> Result<O>
    where
        F: FnMut() -> Result<O>,
    {
        let mut backoff = self.config.retry_policy().backoff();
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => match backoff.next_delay() {
                    Some(delay) => {
                        tracing::warn!(
                            delay_ms = delay.as_millis() as u64,
                            "transient failure establishing admin session, retrying"
                        );
                        std::thread::sleep(delay);
                    }
                    None => return Err(err),
                },
                Err(err) => return Err(err),
            }
        }
    }
}
