//! The error taxonomy surfaced by adapter operations
//!
//! Every public operation either returns a well-typed result or fails with
//! one of the kinds below. Absence on plain lookups is expressed as
//! `Ok(None)` rather than an error, so callers can distinguish "not there"
//! from "broken" without inspecting error internals.

use std::fmt;

use thiserror::Error;

/// A convenience alias for results produced by this crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The kind of entity a failed reference pointed at
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    /// A user within the realm
    User,
    /// A realm or client role
    Role,
    /// A registered client
    Client,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResourceKind::User => f.write_str("user"),
            ResourceKind::Role => f.write_str("role"),
            ResourceKind::Client => f.write_str("client"),
        }
    }
}

/// An error surfaced by an adapter operation
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The authorization server rejected the presented credentials or
    /// refresh token with no recovery path
    #[error("authentication rejected by the authorization server: {reason}")]
    Authentication {
        /// The server's stated reason, when one was provided
        reason: String,
    },

    /// The authenticated identity lacks the privilege required for the
    /// requested operation
    #[error("insufficient privileges to {operation}")]
    Authorization {
        /// The operation that was denied
        operation: String,
    },

    /// The referenced user, role, or client does not exist
    #[error("{kind} not found")]
    NotFound {
        /// What the dangling reference pointed at
        kind: ResourceKind,
    },

    /// The server rejected the request as malformed or conflicting
    #[error("request rejected as invalid: {reason}")]
    Validation {
        /// The server's stated reason
        reason: String,
    },

    /// The authorization server could not be reached, or failed in a way
    /// that is not attributable to the request itself
    #[error("authorization server unavailable")]
    ServiceUnavailable {
        /// The underlying transport failure, when one is available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// The presented token is expired or no longer valid
    ///
    /// Raised only from validation paths; never suppressed by a cache hit.
    #[error("token is expired or no longer valid")]
    TokenExpired,
}

impl Error {
    pub(crate) fn authentication(reason: impl Into<String>) -> Self {
        Error::Authentication {
            reason: reason.into(),
        }
    }

    pub(crate) fn authorization(operation: impl Into<String>) -> Self {
        Error::Authorization {
            operation: operation.into(),
        }
    }

    pub(crate) fn not_found(kind: ResourceKind) -> Self {
        Error::NotFound { kind }
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Error::Validation {
            reason: reason.into(),
        }
    }

    pub(crate) fn unavailable(
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Error::ServiceUnavailable {
            source: Some(source.into()),
        }
    }

    /// Whether the failure is transient and worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::ServiceUnavailable { .. })
    }
}
