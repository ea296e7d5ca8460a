//! Unified error handling for the client.
//!
//! Every failure is local to the interaction that triggered it: the caller
//! gets a [`ClientError`], state stays as it was, and nothing is retried.

use extickets_core::{ReviewDecision, Role, TicketId};
use thiserror::Error;

use crate::storage::StorageError;
use crate::view::Tab;

/// Input rejected before any request is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The identity provider returned no credential.
    #[error("missing identity provider credential")]
    MissingIdToken,

    /// Username/password did not match the admin pair.
    #[error("Invalid admin credentials")]
    InvalidAdminCredentials,

    /// A required text field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The event image is not an image.
    #[error("event image must be an image file, got {0}")]
    NotAnImage(String),

    /// The ticket file is not a PDF.
    #[error("ticket file must be a PDF: {0}")]
    NotAPdf(String),

    /// A rejection needs a reason.
    #[error("a comment is required to reject a ticket")]
    MissingComment,

    /// A path parameter of exactly `.` or `..` would be resolved away.
    #[error("{0} cannot be \".\" or \"..\"")]
    DotSegment(&'static str),
}

/// Client-level error type.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// An endpoint URL could not be built from the configured base.
    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    /// Response body missing or not in the expected shape.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Local validation failed.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Persisted session could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Operation requires a logged-in identity.
    #[error("Not logged in")]
    NotAuthenticated,

    /// The current role has no access to this action.
    #[error("Forbidden: {action} is not available to role {role}")]
    Forbidden { action: &'static str, role: Role },

    /// The requested tab is not part of the current role's view.
    #[error("Tab {tab} is not available to role {role}")]
    TabNotAvailable { tab: Tab, role: Role },

    /// The same review action is still waiting for the backend.
    #[error("{decision} already in progress for ticket {ticket_id}")]
    AlreadyInFlight {
        ticket_id: TicketId,
        decision: ReviewDecision,
    },
}

impl ClientError {
    /// Short message suitable for showing to the person at the keyboard.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) => "Could not reach the server. Please try again.".to_string(),
            Self::Status { message, .. } if !message.is_empty() => message.clone(),
            Self::Status { status, .. } => format!("Request failed ({status})"),
            Self::InvalidEndpoint(_) => "The client is misconfigured.".to_string(),
            Self::Decode(_) => "The server sent an unexpected response.".to_string(),
            Self::Validation(e) => e.to_string(),
            Self::Storage(_) => "Could not access the saved session.".to_string(),
            Self::NotAuthenticated => "Please log in first.".to_string(),
            Self::Forbidden { .. } | Self::TabNotAvailable { .. } => {
                "That action is not available for your account.".to_string()
            }
            Self::AlreadyInFlight { .. } => "Still working on the previous request.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ClientError::Status {
            status: 404,
            message: "Not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        let err = ClientError::from(ValidationError::MissingField("venue"));
        assert_eq!(err.to_string(), "Validation error: venue is required");
    }

    #[test]
    fn test_user_message_prefers_backend_message() {
        let err = ClientError::Status {
            status: 401,
            message: "Token expired".to_string(),
        };
        assert_eq!(err.user_message(), "Token expired");

        let err = ClientError::Status {
            status: 500,
            message: String::new(),
        };
        assert_eq!(err.user_message(), "Request failed (500)");
    }

    #[test]
    fn test_user_message_for_admin_mismatch() {
        let err = ClientError::from(ValidationError::InvalidAdminCredentials);
        assert_eq!(err.user_message(), "Invalid admin credentials");
    }
}
