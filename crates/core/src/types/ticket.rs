//! Ticket record as known to the client.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::event_time::EventDateTime;
use super::id::TicketId;
use super::price::Price;
use super::status::TicketStatus;

/// One uploaded ticket.
///
/// Field names follow the backend's JSON. Everything the backend may omit is
/// optional: locally built tickets have no `id`, and `user_email` is only
/// filled in on admin listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TicketId>,
    pub event_name: String,
    pub event_date_time: EventDateTime,
    pub venue: String,
    pub price: Price,
    /// Owner's email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_email: Option<Email>,
    /// Reference to the event image stored by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_image_path: Option<String>,
    /// Reference to the ticket PDF stored by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
}

impl Ticket {
    /// Build a ticket with only the listing metadata set.
    #[must_use]
    pub fn new(
        event_name: impl Into<String>,
        event_date_time: EventDateTime,
        venue: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id: None,
            event_name: event_name.into(),
            event_date_time,
            venue: venue.into(),
            price,
            user_email: None,
            event_image_path: None,
            file_path: None,
            status: None,
        }
    }

    /// Whether the backend reports this ticket as awaiting review.
    #[must_use]
    pub fn is_in_review(&self) -> bool {
        self.status == Some(TicketStatus::InReview)
    }
}
