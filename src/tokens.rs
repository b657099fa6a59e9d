//! Token lifetime types

use aliri_clock::{Clock, DurationSecs, System, UnixTime};

use crate::braids::{AccessToken, AccessTokenRef, RefreshToken, RefreshTokenRef};

/// A bundle of tokens as minted by the authorization server, stamped with
/// lifetime information at the moment it was received
///
/// A token set is never mutated; a refresh produces a new one. The set
/// itself is never cached; only the adapter's admin session holds on to
/// one beyond the caller's use.
#[derive(Clone, Debug)]
pub struct TokenSet {
    access_token: AccessToken,
    refresh_token: Option<RefreshToken>,
    token_type: String,
    scope: Option<String>,
    issued: UnixTime,
    lifetime: DurationSecs,
    expiry: UnixTime,
}

impl TokenSet {
    /// Constructs a token set issued now according to the system clock
    pub fn new(
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
        token_type: impl Into<String>,
        scope: Option<String>,
        lifetime: DurationSecs,
    ) -> Self {
        Self::with_clock(access_token, refresh_token, token_type, scope, lifetime, &System)
    }

    /// Constructs a token set issued now according to the provided clock
    pub fn with_clock<C: Clock>(
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
        token_type: impl Into<String>,
        scope: Option<String>,
        lifetime: DurationSecs,
        clock: &C,
    ) -> Self {
        let issued = clock.now();
        Self {
            access_token,
            refresh_token,
            token_type: token_type.into(),
            scope,
            issued,
            lifetime,
            expiry: issued + lifetime,
        }
    }

    /// The access token
    #[inline]
    pub fn access_token(&self) -> &AccessTokenRef {
        &self.access_token
    }

    /// The refresh token, when the grant produced one
    #[inline]
    pub fn refresh_token(&self) -> Option<&RefreshTokenRef> {
        self.refresh_token.as_deref()
    }

    /// The token type reported by the server (normally `Bearer`)
    #[inline]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// The granted scope, when the server reported one
    #[inline]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// When the token set was received
    #[inline]
    pub fn issued(&self) -> UnixTime {
        self.issued
    }

    /// The access token's lifetime as reported by the server
    #[inline]
    pub fn lifetime(&self) -> DurationSecs {
        self.lifetime
    }

    /// When the access token expires
    #[inline]
    pub fn expiry(&self) -> UnixTime {
        self.expiry
    }

    /// Whether the access token is expired as of the provided time
    #[inline]
    pub fn is_expired_at(&self, time: UnixTime) -> bool {
        time >= self.expiry
    }
}

/// The administrative session: a privileged token set plus the deadline
/// after which it must be refreshed before further use
///
/// The deadline sits `safety_margin` ahead of actual expiry so a token
/// handed to a privileged call cannot expire mid-flight. A session is
/// replaced wholesale on refresh; a failed refresh leaves the previous
/// session untouched.
#[derive(Debug)]
pub(crate) struct AdminSession {
    tokens: TokenSet,
    refresh_deadline: UnixTime,
}

impl AdminSession {
    pub(crate) fn new(tokens: TokenSet, safety_margin: DurationSecs) -> Self {
        let refresh_deadline = UnixTime(tokens.expiry().0.saturating_sub(safety_margin.0));
        Self {
            tokens,
            refresh_deadline,
        }
    }

    pub(crate) fn tokens(&self) -> &TokenSet {
        &self.tokens
    }

    pub(crate) fn needs_refresh(&self, now: UnixTime) -> bool {
        now >= self.refresh_deadline
    }
}
