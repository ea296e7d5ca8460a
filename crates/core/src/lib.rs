//! ExTickets Core - Shared domain types.
//!
//! This crate provides the types used across all ExTickets components:
//! - `client` - Session state, ticket cache and backend REST client
//! - `cli` - Command-line surface over the client
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! Everything here mirrors what the backend sends and accepts on the wire.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for emails, ticket IDs, prices, event times,
//!   statuses and roles, plus the [`Identity`] and [`Ticket`] records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
