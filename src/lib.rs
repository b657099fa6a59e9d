//! A cache-coherent Keycloak client with a managed administrative session
//!
//! This crate wraps a Keycloak realm's OpenID Connect and admin REST
//! surfaces behind a typed facade. Expensive lookups are cached under
//! per-operation TTLs, writes invalidate exactly the entries they could
//! have staled, and every privileged call draws its token from an
//! administrative session that refreshes itself ahead of expiry with at
//! most one refresh in flight at a time.
//!
//! The same operations are offered on two surfaces: [`Adapter`] for async
//! callers and [`blocking::Adapter`] for threaded ones. The two share
//! their cache policy, invalidation rules, and error taxonomy, so moving
//! between them never changes semantics.
//!
//! ```no_run
//! use keycloak_adapter::{Adapter, ClientId, ClientSecret, KeycloakConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = KeycloakConfig::builder(
//!     "https://sso.example.com",
//!     "acme",
//!     ClientId::from_static("backend"),
//! )
//! .client_secret(ClientSecret::from_static("s3cr3t"))
//! .build()?;
//!
//! let adapter = Adapter::new(config)?;
//! if let Some(user) = adapter.get_user_by_username("alice").await? {
//!     println!("found {}", user.id);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features
)]

mod adapter;
mod backoff;
pub mod blocking;
mod braids;
mod cache;
mod config;
mod errors;
mod http;
mod records;
mod session;
mod tokens;
mod transport;

pub use adapter::Adapter;
pub use backoff::RetryPolicy;
pub use braids::{
    AccessToken, AccessTokenRef, ClientId, ClientIdRef, ClientSecret, ClientSecretRef,
    RefreshToken, RefreshTokenRef, UserId, UserIdRef,
};
pub use config::{AdminCredentials, ConfigError, KeycloakConfig, KeycloakConfigBuilder};
pub use errors::{Error, ResourceKind, Result};
pub use http::{BlockingHttpTransport, HttpTransport};
pub use records::{ClientRecord, RoleRecord, UserInfo, UserRecord};
pub use tokens::TokenSet;
pub use transport::{BlockingKeycloakTransport, KeycloakTransport, UserQuery};

#[doc(no_inline)]
pub use aliri_clock::{Clock, DurationSecs, System, UnixTime};
