//! Marketplace controller.
//!
//! Composes the session store, ticket cache, home-view board, persisted
//! session and REST client behind one cheaply cloneable handle. Every
//! operation checks preconditions, talks to the backend, then dispatches to
//! the stores. Locks are taken per step and never held across a request.

use std::sync::Arc;

use extickets_core::{Identity, ReviewDecision, Role, Ticket, TicketId, TicketStatus};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::api::{ApiClient, GoogleSession, TicketQuery, UploadRequest, is_dot_segment};
use crate::config::ClientConfig;
use crate::error::{ClientError, ValidationError};
use crate::inflight::{ActionKey, InFlight};
use crate::session::{SessionSnapshot, SessionStore};
use crate::storage::{FileStore, KeyValueStore, PersistedSession};
use crate::tickets::TicketCache;
use crate::view::{Tab, TicketBoard, ViewProfile};

/// Bearer token stored for admin sessions; the backend issues none for them.
pub const ADMIN_TOKEN: &str = "admin-token";

/// Display name of the admin identity.
pub const ADMIN_NAME: &str = "Admin";

/// Comment sent with an approval when none is given.
pub const DEFAULT_APPROVE_COMMENT: &str = "Approved";

/// Handle to the marketplace client state.
///
/// Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct Marketplace {
    inner: Arc<MarketplaceInner>,
}

struct MarketplaceInner {
    config: ClientConfig,
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    session: RwLock<SessionStore>,
    token: RwLock<Option<SecretString>>,
    cache: RwLock<TicketCache>,
    board: RwLock<TicketBoard>,
    inflight: InFlight,
}

impl std::fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Marketplace {
    /// Create a marketplace persisting its session in `store`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: ClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config)?;
        Ok(Self {
            inner: Arc::new(MarketplaceInner {
                config,
                api,
                store,
                session: RwLock::new(SessionStore::new()),
                token: RwLock::new(None),
                cache: RwLock::new(TicketCache::new()),
                board: RwLock::new(TicketBoard::new()),
                inflight: InFlight::new(),
            }),
        })
    }

    /// Create a marketplace persisting its session in the configured state file.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn from_config(config: ClientConfig) -> Result<Self, ClientError> {
        let store = Arc::new(FileStore::new(config.state_file.clone()));
        Self::new(config, store)
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Re-enter the session saved by an earlier run, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<Identity>, ClientError> {
        let Some(saved) = PersistedSession::load(self.inner.store.as_ref())? else {
            debug!("No saved session");
            return Ok(None);
        };

        self.admit(saved.token, saved.identity).await;
        let identity = self
            .inner
            .session
            .read()
            .await
            .identity()
            .cloned()
            .ok_or(ClientError::NotAuthenticated)?;
        info!(email = %identity.email, role = %identity.role, "Session restored");
        Ok(Some(identity))
    }

    /// Log in with an identity-provider ID token.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for an empty token and otherwise
    /// whatever the exchange or persisting the session fails with. The
    /// failure is also recorded as the session's login error.
    #[instrument(skip(self, id_token))]
    pub async fn login_with_google(&self, id_token: &SecretString) -> Result<Identity, ClientError> {
        let result = self.exchange_google(id_token).await;
        self.settle_login(result).await
    }

    async fn exchange_google(&self, id_token: &SecretString) -> Result<Identity, ClientError> {
        if id_token.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingIdToken.into());
        }

        let GoogleSession { token, mut identity } =
            self.inner.api.exchange_google_token(id_token).await?;
        let token = token.unwrap_or_else(|| SecretString::from(id_token.expose_secret()));
        identity.role = Role::User;
        identity.is_google = true;

        self.persist_and_admit(token, identity).await
    }

    /// Log in as the admin.
    ///
    /// Credentials are checked locally; no request is sent.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidAdminCredentials` on a mismatch, or a
    /// storage error if the session cannot be saved. The failure is also
    /// recorded as the session's login error.
    #[instrument(skip(self, password))]
    pub async fn login_admin(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Identity, ClientError> {
        let result = self.check_admin(username, password).await;
        self.settle_login(result).await
    }

    async fn check_admin(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Identity, ClientError> {
        let admin = &self.inner.config.admin;
        if !admin.matches(username, password) {
            return Err(ValidationError::InvalidAdminCredentials.into());
        }

        let mut identity = Identity::new(ADMIN_NAME, admin.email.clone());
        identity.role = Role::Admin;
        self.persist_and_admit(SecretString::from(ADMIN_TOKEN), identity)
            .await
    }

    async fn settle_login(
        &self,
        result: Result<Identity, ClientError>,
    ) -> Result<Identity, ClientError> {
        match result {
            Ok(identity) => {
                info!(email = %identity.email, role = %identity.role, "Logged in");
                Ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.inner
                    .session
                    .write()
                    .await
                    .set_login_error(e.user_message());
                Err(e)
            }
        }
    }

    async fn persist_and_admit(
        &self,
        token: SecretString,
        identity: Identity,
    ) -> Result<Identity, ClientError> {
        let saved = PersistedSession { token, identity };
        saved.save(self.inner.store.as_ref())?;

        let identity = saved.identity.clone();
        self.admit(saved.token, saved.identity).await;
        Ok(identity)
    }

    /// Install token and identity, dispatching the login matching the
    /// identity's provenance. The session store derives the role from it.
    async fn admit(&self, token: SecretString, identity: Identity) {
        self.inner.board.write().await.invalidate();
        *self.inner.token.write().await = Some(token);

        let mut session = self.inner.session.write().await;
        if identity.is_google {
            session.login_with_google(identity);
        } else {
            session.login_admin(identity);
        }
    }

    /// Log out and forget the saved session.
    ///
    /// In-memory state is cleared even if the store fails.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Storage` if the saved session cannot be removed.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ClientError> {
        let cleared = PersistedSession::clear(self.inner.store.as_ref());

        self.inner.board.write().await.invalidate();
        *self.inner.token.write().await = None;
        self.inner.session.write().await.logout();
        info!("Logged out");

        cleared.map_err(ClientError::from)
    }

    // =========================================================================
    // Tickets
    // =========================================================================

    /// Fetch the listing behind `tab` and show it on the board.
    ///
    /// Returns `Ok(None)` when a newer fetch, a login or a logout happened
    /// while this one was in flight; the board is then left alone. Any call,
    /// even one refused below, supersedes fetches already in flight.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotAuthenticated` without a session,
    /// `ClientError::TabNotAvailable` if the role has no such tab, and the
    /// request's error otherwise. A failed fetch leaves the board unchanged.
    #[instrument(skip(self))]
    pub async fn refresh(&self, tab: Tab) -> Result<Option<Vec<Ticket>>, ClientError> {
        // Start the fetch before reading credentials, so a login or logout
        // landing in between makes it stale.
        let fetch = self.inner.board.write().await.begin(tab);
        let (identity, token) = self.credentials().await?;
        if !ViewProfile::for_role(Some(identity.role)).allows(fetch.tab()) {
            return Err(ClientError::TabNotAvailable {
                tab,
                role: identity.role,
            });
        }

        let query = match fetch.tab() {
            Tab::InReview => TicketQuery::ByStatus(TicketStatus::InReview),
            Tab::Approved => TicketQuery::ByStatus(TicketStatus::Approved),
            Tab::MyTickets => TicketQuery::OwnedBy(identity.email),
        };

        let tickets = self.inner.api.list_tickets(&token, &query).await?;

        if self.inner.board.write().await.apply(fetch, tickets.clone()) {
            debug!(count = tickets.len(), "Board updated");
            Ok(Some(tickets))
        } else {
            debug!("Dropping stale fetch result");
            Ok(None)
        }
    }

    /// Approve a ticket. A blank or missing comment is replaced by
    /// [`DEFAULT_APPROVE_COMMENT`].
    ///
    /// # Errors
    ///
    /// See [`Self::reject`].
    pub async fn approve(
        &self,
        ticket_id: &TicketId,
        comment: Option<&str>,
    ) -> Result<(), ClientError> {
        let comment = comment
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_APPROVE_COMMENT);
        self.review(ticket_id, ReviewDecision::Approve, comment).await
    }

    /// Reject a ticket with a reason.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingComment` for a blank comment,
    /// `ValidationError::DotSegment` for an id or comment of `.` or `..`,
    /// `ClientError::NotAuthenticated` without a session,
    /// `ClientError::Forbidden` for non-admins,
    /// `ClientError::AlreadyInFlight` while the same action is pending, and
    /// the request's error otherwise.
    pub async fn reject(&self, ticket_id: &TicketId, comment: &str) -> Result<(), ClientError> {
        if comment.trim().is_empty() {
            return Err(ValidationError::MissingComment.into());
        }
        self.review(ticket_id, ReviewDecision::Reject, comment).await
    }

    #[instrument(skip(self, comment), fields(ticket_id = %ticket_id))]
    async fn review(
        &self,
        ticket_id: &TicketId,
        decision: ReviewDecision,
        comment: &str,
    ) -> Result<(), ClientError> {
        if is_dot_segment(ticket_id.as_str()) {
            return Err(ValidationError::DotSegment("ticket id").into());
        }
        if is_dot_segment(comment) {
            return Err(ValidationError::DotSegment("comment").into());
        }

        let (identity, token) = self.credentials().await?;
        if !identity.is_admin() {
            return Err(ClientError::Forbidden {
                action: "review",
                role: identity.role,
            });
        }

        let Some(guard) = self
            .inner
            .inflight
            .try_begin(ActionKey::new(ticket_id.clone(), decision))
        else {
            return Err(ClientError::AlreadyInFlight {
                ticket_id: ticket_id.clone(),
                decision,
            });
        };

        self.inner
            .api
            .change_status(&token, ticket_id, decision, comment)
            .await?;
        drop(guard);
        info!(%decision, "Ticket reviewed");

        if let Err(e) = self.refresh(Tab::InReview).await {
            warn!(error = %e, "Review succeeded but the in-review list could not be refreshed");
        }
        Ok(())
    }

    /// Upload a ticket and add the created ticket to the cache.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotAuthenticated` without a session,
    /// `ClientError::Forbidden` for admins, `ClientError::Validation` for an
    /// incomplete request, and the request's error otherwise. The cache is
    /// only touched on success.
    #[instrument(skip(self, request), fields(event = %request.event_name))]
    pub async fn upload(&self, request: UploadRequest) -> Result<Ticket, ClientError> {
        let (identity, token) = self.credentials().await?;
        if identity.is_admin() {
            return Err(ClientError::Forbidden {
                action: "upload",
                role: identity.role,
            });
        }

        let ticket = self.inner.api.upload_ticket(&token, request).await?;
        self.inner.cache.write().await.add_ticket(ticket.clone());
        info!(ticket_id = ?ticket.id, "Ticket uploaded");
        Ok(ticket)
    }

    async fn credentials(&self) -> Result<(Identity, SecretString), ClientError> {
        let identity = self
            .inner
            .session
            .read()
            .await
            .identity()
            .cloned()
            .ok_or(ClientError::NotAuthenticated)?;
        let token = self
            .inner
            .token
            .read()
            .await
            .as_ref()
            .map(|t| SecretString::from(t.expose_secret()))
            .ok_or(ClientError::NotAuthenticated)?;
        Ok((identity, token))
    }

    // =========================================================================
    // Read surface
    // =========================================================================

    /// Current session state.
    pub async fn session(&self) -> SessionSnapshot {
        self.inner.session.read().await.snapshot()
    }

    /// Tickets uploaded through this handle, in upload order.
    pub async fn cached_tickets(&self) -> Vec<Ticket> {
        self.inner.cache.read().await.tickets().to_vec()
    }

    /// The list the home view shows.
    pub async fn board(&self) -> TicketBoard {
        self.inner.board.read().await.clone()
    }

    /// View profile for the current role.
    pub async fn profile(&self) -> ViewProfile {
        ViewProfile::for_role(self.inner.session.read().await.role())
    }
}
