//! The authenticated principal.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::status::Role;

/// Profile and role of the logged-in principal.
///
/// `role` and `is_google` are coerced by the login path that produced the
/// identity: the identity-provider path yields `User` with `is_google = true`,
/// the admin path yields `Admin` with `is_google = false`. Both fields
/// default when absent so payloads straight from the auth service decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Display name.
    pub name: String,
    /// Email address; the natural key of an identity.
    pub email: Email,
    /// Optional profile picture reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Whether the identity came from the third-party identity provider.
    #[serde(default)]
    pub is_google: bool,
    /// Role in the marketplace.
    #[serde(default)]
    pub role: Role,
}

impl Identity {
    /// Create an identity with no picture, tagged as a plain user.
    #[must_use]
    pub fn new(name: impl Into<String>, email: Email) -> Self {
        Self {
            name: name.into(),
            email,
            picture: None,
            is_google: false,
            role: Role::User,
        }
    }

    /// Whether this identity carries the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
