//! REST client for the ExTickets backend.
//!
//! # Architecture
//!
//! - Three base URLs (auth, ticket API, review API) from [`ClientConfig`]
//! - Bearer token passed per call; the client itself holds no session
//! - Path parameters are pushed as individual percent-encoded segments, so
//!   emails and review comments containing `/`, `?` or `#` stay one segment
//! - Segments of exactly `.` or `..` are refused; URL parsing would resolve
//!   them as dot-segments even when percent-encoded
//!
//! # Endpoints
//!
//! - `POST /auth/google` - exchange an identity-provider token ([`auth`])
//! - `GET /api/admin/tickets/status/{in-review|approved}` ([`tickets`])
//! - `GET /api/tickets/user/{email}` ([`tickets`])
//! - `POST /api/admin/tickets/ticket/{id}/changeStatus/{status}/comments/{comment}` ([`tickets`])
//! - `POST /api/tickets/upload` - multipart ([`upload`])

pub mod auth;
pub mod tickets;
pub mod upload;

pub use auth::GoogleSession;
pub use tickets::TicketQuery;
pub use upload::{Attachment, UploadRequest};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// ExTickets backend client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_url: Url,
    auth_url: Url,
    review_url: Url,
}

/// Error body some backend routes return.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("extickets-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            auth_url: config.auth_url.clone(),
            review_url: config.review_url.clone(),
        })
    }
}

/// Whether `segment` would be resolved as `.` or `..` in a URL path.
pub(crate) fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

/// Append path segments to `base`, percent-encoding each one.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, ClientError> {
    if let Some(dot) = segments.iter().find(|s| is_dot_segment(s)) {
        return Err(ClientError::InvalidEndpoint(format!(
            "{base} with path segment {dot:?}"
        )));
    }
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ClientError::InvalidEndpoint(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Turn a non-success response into [`ClientError::Status`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .unwrap_or(text);

    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Check the status and decode the JSON body.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Err(ClientError::Decode("empty response body".to_string()));
    }
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_segments() {
        let base = Url::parse("http://localhost:8080").unwrap();
        let url = endpoint(&base, &["api", "tickets", "upload"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/tickets/upload");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse("https://example.test/backend/").unwrap();
        let url = endpoint(&base, &["auth", "google"]).unwrap();
        assert_eq!(url.as_str(), "https://example.test/backend/auth/google");
    }

    #[test]
    fn test_endpoint_encodes_path_significant_characters() {
        let base = Url::parse("http://localhost:8080").unwrap();
        let url = endpoint(&base, &["comments", "fake/duplicate? see #2"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/comments/fake%2Fduplicate%3F%20see%20%232"
        );
    }

    #[test]
    fn test_endpoint_refuses_dot_segments() {
        let base = Url::parse("http://localhost:8080").unwrap();
        for dot in [".", ".."] {
            let err = endpoint(&base, &["comments", dot, "x"]).unwrap_err();
            assert!(matches!(err, ClientError::InvalidEndpoint(_)));
        }
        let url = endpoint(&base, &["comments", "...", ".x"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/comments/.../.x");
    }
}
