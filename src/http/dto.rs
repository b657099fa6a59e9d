//! Wire payloads exchanged with the authorization server

use aliri_clock::{Clock, DurationSecs};
use serde::{Deserialize, Serialize};

use crate::braids::{AccessToken, RefreshToken};
use crate::tokens::TokenSet;

fn bearer() -> String {
    String::from("Bearer")
}

/// The token endpoint's success payload
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
    #[serde(default = "bearer")]
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
    pub expires_in: DurationSecs,
}

impl TokenResponse {
    pub(crate) fn into_token_set<C: Clock>(self, clock: &C) -> TokenSet {
        TokenSet::with_clock(
            self.access_token,
            self.refresh_token,
            self.token_type,
            self.scope,
            self.expires_in,
            clock,
        )
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordGrant<'a> {
    pub grant_type: &'static str,
    pub client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<&'a str>,
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClientCredentialsGrant<'a> {
    pub grant_type: &'static str,
    pub client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AuthorizationCodeGrant<'a> {
    pub grant_type: &'static str,
    pub client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<&'a str>,
    pub code: &'a str,
    pub redirect_uri: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshGrant<'a> {
    pub grant_type: &'static str,
    pub client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<&'a str>,
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LogoutRequest<'a> {
    pub client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<&'a str>,
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct IntrospectRequest<'a> {
    pub client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<&'a str>,
    pub token: &'a str,
}

/// A UMA ticket exchange asking only for a grant/deny decision
#[derive(Debug, Serialize)]
pub(crate) struct UmaDecisionRequest<'a> {
    pub grant_type: &'static str,
    pub audience: &'a str,
    pub permission: &'a str,
    pub response_mode: &'static str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionResponse {
    pub result: bool,
}

/// The password credential payload for the admin reset endpoint
#[derive(Debug, Serialize)]
pub(crate) struct CredentialRepresentation<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: &'a str,
    pub temporary: bool,
}

/// The slice of the public realm document the adapter consumes
#[derive(Debug, Deserialize)]
pub(crate) struct RealmDocument {
    pub public_key: String,
}
