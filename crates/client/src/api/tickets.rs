//! Ticket listing and review endpoints.

use extickets_core::{Email, ReviewDecision, Ticket, TicketId, TicketStatus};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use super::{ApiClient, check_status, endpoint, read_json};
use crate::error::ClientError;

/// Which listing to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketQuery {
    /// All tickets with the given status (admin listing routes).
    ByStatus(TicketStatus),
    /// Tickets uploaded by one user.
    OwnedBy(Email),
}

impl TicketQuery {
    fn segments(&self) -> Vec<&str> {
        match self {
            Self::ByStatus(status) => vec!["api", "admin", "tickets", "status", status.as_str()],
            Self::OwnedBy(email) => vec!["api", "tickets", "user", email.as_str()],
        }
    }
}

/// Listing responses are either a bare array or `{ "tickets": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TicketList {
    Bare(Vec<Ticket>),
    Wrapped { tickets: Vec<Ticket> },
}

impl From<TicketList> for Vec<Ticket> {
    fn from(list: TicketList) -> Self {
        match list {
            TicketList::Bare(tickets) | TicketList::Wrapped { tickets } => tickets,
        }
    }
}

impl ApiClient {
    /// Fetch a ticket listing.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` on a non-success response,
    /// `ClientError::Decode` if the body is not a ticket list, and
    /// `ClientError::Http` on network failures.
    #[instrument(skip(self, token))]
    pub async fn list_tickets(
        &self,
        token: &SecretString,
        query: &TicketQuery,
    ) -> Result<Vec<Ticket>, ClientError> {
        let url = endpoint(&self.api_url, &query.segments())?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        let list: TicketList = read_json(response).await?;
        let tickets: Vec<Ticket> = list.into();
        tracing::debug!(count = tickets.len(), "Fetched tickets");
        Ok(tickets)
    }

    /// Move a ticket to approved or rejected.
    ///
    /// The comment travels as a single percent-encoded path segment.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Status` if the backend refuses the change and
    /// `ClientError::Http` on network failures.
    #[instrument(skip(self, token, comment), fields(ticket_id = %ticket_id))]
    pub async fn change_status(
        &self,
        token: &SecretString,
        ticket_id: &TicketId,
        decision: ReviewDecision,
        comment: &str,
    ) -> Result<(), ClientError> {
        let url = endpoint(
            &self.review_url,
            &[
                "api",
                "admin",
                "tickets",
                "ticket",
                ticket_id.as_str(),
                "changeStatus",
                decision.target_status().as_str(),
                "comments",
                comment,
            ],
        )?;

        let response = self
            .http
            .post(url)
            .bearer_auth(token.expose_secret())
            .header("Content-Type", "application/json")
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }
}
