//! ExTickets client library.
//!
//! Holds the client-side state of the marketplace and talks to the backend:
//! - [`session`] - who is logged in, the known-users ledger, the login error
//! - [`tickets`] - append-only cache of tickets uploaded in this process
//! - [`view`] - per-role view profile and the home-view ticket board
//! - [`api`] - REST client for the auth, ticket and review services
//! - [`storage`] - persisted bearer token and identity
//! - [`marketplace`] - the controller tying them together
//!
//! All business rules (status transitions, ownership, token validation) are
//! enforced by the backend; the client only checks what it can before sending.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod inflight;
pub mod marketplace;
pub mod session;
pub mod storage;
pub mod tickets;
pub mod view;

pub use api::{ApiClient, Attachment, GoogleSession, TicketQuery, UploadRequest};
pub use config::{AdminCredentials, ClientConfig, ConfigError};
pub use error::{ClientError, ValidationError};
pub use marketplace::Marketplace;
pub use session::{SessionSnapshot, SessionStore};
pub use storage::{FileStore, KeyValueStore, MemoryStore, PersistedSession, StorageError};
pub use tickets::TicketCache;
pub use view::{Tab, TicketBoard, ViewProfile, render_ticket};
