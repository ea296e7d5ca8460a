//! Identity-provider token exchange.

use extickets_core::{Email, Identity};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, endpoint, read_json};
use crate::error::ClientError;

/// Request body for `POST /auth/google`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GoogleAuthRequest<'a> {
    id_token: &'a str,
}

/// Profile fields, either at the top level or nested under `user`.
#[derive(Debug, Default, Deserialize)]
struct UserPayload {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Response from `POST /auth/google`.
///
/// Two shapes are in use: `{token, name, email}` and `{user: {...}, token}`.
#[derive(Debug, Deserialize)]
struct GoogleAuthResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<UserPayload>,
    #[serde(flatten)]
    top_level: UserPayload,
}

/// Result of a successful exchange.
#[derive(Debug, Clone)]
pub struct GoogleSession {
    /// Server-issued bearer token, when the auth service returns one.
    pub token: Option<SecretString>,
    /// Profile as reported by the auth service.
    pub identity: Identity,
}

impl GoogleAuthResponse {
    fn into_session(self) -> Result<GoogleSession, ClientError> {
        let user = self.user.unwrap_or(self.top_level);
        let raw_email = user
            .email
            .ok_or_else(|| ClientError::Decode("Invalid user data: missing email".to_string()))?;
        let email = Email::parse(&raw_email)
            .map_err(|e| ClientError::Decode(format!("Invalid user data: {e}")))?;
        let name = user
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| email.as_str().to_owned());

        let mut identity = Identity::new(name, email);
        identity.picture = user.picture;
        identity.is_google = true;

        Ok(GoogleSession {
            token: self.token.filter(|t| !t.is_empty()).map(SecretString::from),
            identity,
        })
    }
}

impl ApiClient {
    /// Exchange an identity-provider ID token for an application session.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` if the auth service rejects the token,
    /// `ClientError::Decode` if the response carries no usable email, and
    /// `ClientError::Http` on network failures.
    #[instrument(skip(self, id_token))]
    pub async fn exchange_google_token(
        &self,
        id_token: &SecretString,
    ) -> Result<GoogleSession, ClientError> {
        let url = endpoint(&self.auth_url, &["auth", "google"])?;
        let response = self
            .http
            .post(url)
            .json(&GoogleAuthRequest {
                id_token: id_token.expose_secret(),
            })
            .send()
            .await?;

        let body: GoogleAuthResponse = read_json(response).await?;
        let session = body.into_session()?;
        tracing::debug!(email = %session.identity.email, "Identity provider token exchanged");
        Ok(session)
    }
}
