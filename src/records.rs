//! Representations of data returned by the authorization server
//!
//! The adapter does not interpret these beyond the identifiers it needs for
//! cache keys and role-membership checks; everything else is carried
//! opaquely in the flattened tail.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::braids::UserId;

/// A user representation from the admin API
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    /// The user's unique identifier
    pub id: UserId,
    /// The user's username, when present in the representation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// The user's email, when present in the representation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Remaining representation fields, untouched
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// A realm or client role representation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoleRecord {
    /// The role's unique identifier, when the server reported one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The role's name
    pub name: String,
    /// The role's description, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Remaining representation fields, untouched
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// A client representation from the admin API
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientRecord {
    /// The server-internal identifier used in admin REST paths
    pub id: String,
    /// The public client identifier
    #[serde(rename = "clientId")]
    pub client_id: String,
    /// The client secret, present only for confidential clients the
    /// administrative identity may inspect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Remaining representation fields, untouched
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Claims returned by the userinfo endpoint
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserInfo {
    /// The subject the token was issued to
    pub sub: UserId,
    /// All other claims
    #[serde(flatten)]
    pub claims: Map<String, Value>,
}
