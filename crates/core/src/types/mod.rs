//! Core types for ExTickets.
//!
//! This module provides type-safe wrappers for the marketplace's domain concepts.

pub mod email;
pub mod event_time;
pub mod id;
pub mod identity;
pub mod price;
pub mod status;
pub mod ticket;

pub use email::{Email, EmailError};
pub use event_time::{EventDateTime, EventDateTimeError};
pub use id::TicketId;
pub use identity::Identity;
pub use price::{Price, PriceError};
pub use status::*;
pub use ticket::Ticket;
