//! Bundled reqwest-backed transports
//!
//! Both transports share the endpoint layout, wire payloads, and status
//! classification defined here; [`async_impl`] and [`blocking_impl`] differ
//! only in their reqwest client.

use reqwest::{StatusCode, Url};
use serde_json::Value;

use crate::errors::{Error, ResourceKind};

mod async_impl;
mod blocking_impl;
pub(crate) mod dto;

pub use async_impl::HttpTransport;
pub use blocking_impl::BlockingHttpTransport;

/// URL layout of one realm's endpoints on one server
#[derive(Clone, Debug)]
pub(crate) struct Endpoints {
    base: String,
    realm: String,
}

impl Endpoints {
    pub(crate) fn new(server_url: &Url, realm: &str) -> Self {
        let mut base = server_url.as_str().to_owned();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self {
            base,
            realm: realm.to_owned(),
        }
    }

    fn oidc(&self, leaf: &str) -> String {
        format!(
            "{}realms/{}/protocol/openid-connect/{}",
            self.base, self.realm, leaf
        )
    }

    pub(crate) fn token(&self) -> String {
        self.oidc("token")
    }

    pub(crate) fn logout(&self) -> String {
        self.oidc("logout")
    }

    pub(crate) fn userinfo(&self) -> String {
        self.oidc("userinfo")
    }

    pub(crate) fn introspect(&self) -> String {
        self.oidc("token/introspect")
    }

    pub(crate) fn certs(&self) -> String {
        self.oidc("certs")
    }

    pub(crate) fn realm_document(&self) -> String {
        format!("{}realms/{}", self.base, self.realm)
    }

    pub(crate) fn well_known(&self) -> String {
        format!(
            "{}realms/{}/.well-known/openid-configuration",
            self.base, self.realm
        )
    }

    pub(crate) fn admin(&self, tail: &str) -> String {
        format!("{}admin/realms/{}/{}", self.base, self.realm, tail)
    }
}

/// Pulls the most specific human-readable detail out of an error body
pub(crate) fn error_reason(body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        ["error_description", "errorMessage", "error"]
            .iter()
            .find_map(|key| v.get(key).and_then(Value::as_str).map(str::to_owned))
    });

    match detail {
        Some(detail) => detail,
        None if body.trim().is_empty() => String::from("no detail provided"),
        None => body.trim().to_owned(),
    }
}

/// Maps a non-success admin or OIDC response onto the error taxonomy
///
/// `kind` names the entity a 404 would refer to; lookup paths that treat
/// 404 as absence must intercept that status before calling this.
pub(crate) fn classify_status(
    status: StatusCode,
    operation: &str,
    kind: ResourceKind,
    body: &str,
) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::authentication(error_reason(body)),
        StatusCode::FORBIDDEN => Error::authorization(operation),
        StatusCode::NOT_FOUND => Error::not_found(kind),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT => Error::validation(error_reason(body)),
        _ => Error::unavailable(format!("server answered {status}")),
    }
}

/// Maps a non-success token-endpoint response onto the error taxonomy
///
/// The token endpoint reports bad credentials and dead refresh tokens as
/// 400 `invalid_grant`, so 400 joins 401 as an authentication failure here.
pub(crate) fn classify_token_status(status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
            Error::authentication(error_reason(body))
        }
        _ => Error::unavailable(format!("token endpoint answered {status}")),
    }
}

/// Wraps a bare base64 key from the realm document in PEM armor
pub(crate) fn pem_wrap_public_key(key: &str) -> String {
    format!("-----BEGIN PUBLIC KEY-----\n{key}\n-----END PUBLIC KEY-----")
}
