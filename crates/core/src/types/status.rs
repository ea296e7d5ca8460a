//! Status and role enums.
//!
//! Ticket statuses are authoritative only on the backend; the client renders
//! whatever it receives and never validates transitions locally.

use serde::{Deserialize, Serialize};

/// Review status of a ticket as reported by the backend.
///
/// Lifecycle: `in-review -> approved | rejected`. Status strings this client
/// does not know decode as [`TicketStatus::Unknown`] instead of failing the
/// whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    /// Uploaded and waiting for an admin decision.
    InReview,
    /// Accepted by an admin; visible on the public board.
    Approved,
    /// Declined by an admin.
    Rejected,
    /// Any status string this client does not recognise.
    #[serde(other)]
    Unknown,
}

impl TicketStatus {
    /// The wire form (`in-review`, `approved`, `rejected`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InReview => "in-review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision an admin can apply to a ticket under review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    /// The status a successful decision moves the ticket to.
    #[must_use]
    pub const fn target_status(&self) -> TicketStatus {
        match self {
            Self::Approve => TicketStatus::Approved,
            Self::Reject => TicketStatus::Rejected,
        }
    }
}

impl std::fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Role of the logged-in principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Signed in through the identity provider; uploads and browses tickets.
    #[default]
    User,
    /// Signed in through the admin credential pair; reviews tickets.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}
