//! Session store: who is logged in, and as what.
//!
//! The store is state-only. Verifying credentials, persisting the bearer
//! token and talking to the backend all happen in the caller around a
//! dispatch (see [`Marketplace`](crate::Marketplace)). The only write surface
//! is the four operations below; fields are private.
//!
//! States: Anonymous (no identity) and Authenticated (identity tagged `user`
//! or `admin`). Either login moves to Authenticated, replacing any current
//! identity; `logout` moves back to Anonymous.

use extickets_core::{Email, Identity, Role};

/// Current authentication state.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    identity: Option<Identity>,
    known_users: Vec<Identity>,
    login_error: Option<String>,
}

/// Owned copy of the session state for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub is_logged_in: bool,
    pub known_users: Vec<Identity>,
    pub login_error: Option<String>,
}

impl SessionStore {
    /// An anonymous session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the session as an identity-provider user.
    ///
    /// The caller must have obtained `identity` from a successful credential
    /// exchange; the store does not validate it.
    pub fn login_with_google(&mut self, identity: Identity) {
        self.enter(identity, Role::User, true);
    }

    /// Enter the session as the admin.
    ///
    /// The caller must have verified the admin credentials first.
    pub fn login_admin(&mut self, identity: Identity) {
        self.enter(identity, Role::Admin, false);
    }

    /// Leave the session. Idempotent; the known-users ledger is kept.
    pub fn logout(&mut self) {
        self.identity = None;
        self.login_error = None;
    }

    /// Record a message describing why the last login attempt failed.
    pub fn set_login_error(&mut self, message: impl Into<String>) {
        self.login_error = Some(message.into());
    }

    fn enter(&mut self, mut identity: Identity, role: Role, is_google: bool) {
        identity.role = role;
        identity.is_google = is_google;
        if !self.knows(&identity.email) {
            self.known_users.push(identity.clone());
        }
        self.identity = Some(identity);
        self.login_error = None;
    }

    fn knows(&self, email: &Email) -> bool {
        self.known_users.iter().any(|u| &u.email == email)
    }

    /// The logged-in identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Session flag: true iff an identity is present.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }

    /// Role of the logged-in identity.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|i| i.role)
    }

    /// Every distinct identity seen by a login in this process, in first-seen order.
    #[must_use]
    pub fn known_users(&self) -> &[Identity] {
        &self.known_users
    }

    #[must_use]
    pub fn login_error(&self) -> Option<&str> {
        self.login_error.as_deref()
    }

    /// Copy out the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            identity: self.identity.clone(),
            is_logged_in: self.is_logged_in(),
            known_users: self.known_users.clone(),
            login_error: self.login_error.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ann() -> Identity {
        Identity::new("Ann", Email::parse("ann@x.com").unwrap())
    }

    fn admin() -> Identity {
        Identity::new("Admin", Email::parse("admin@company.com").unwrap())
    }

    fn assert_consistent(store: &SessionStore) {
        assert_eq!(store.is_logged_in(), store.identity().is_some());
        let mut emails: Vec<&str> = store
            .known_users()
            .iter()
            .map(|u| u.email.as_str())
            .collect();
        let total = emails.len();
        emails.sort_unstable();
        emails.dedup();
        assert_eq!(emails.len(), total, "known users must be unique by email");
    }

    #[test]
    fn test_starts_anonymous() {
        let store = SessionStore::new();
        assert!(!store.is_logged_in());
        assert!(store.identity().is_none());
        assert!(store.known_users().is_empty());
        assert!(store.login_error().is_none());
    }

    #[test]
    fn test_google_login() {
        let mut store = SessionStore::new();
        store.login_with_google(ann());

        let identity = store.identity().unwrap();
        assert!(store.is_logged_in());
        assert_eq!(identity.name, "Ann");
        assert_eq!(identity.email.as_str(), "ann@x.com");
        assert_eq!(identity.role, Role::User);
        assert!(identity.is_google);
        assert_eq!(store.known_users(), std::slice::from_ref(identity));
    }

    #[test]
    fn test_google_login_coerces_admin_payload_to_user() {
        let mut store = SessionStore::new();
        let mut claimed = ann();
        claimed.role = Role::Admin;
        store.login_with_google(claimed);
        assert_eq!(store.role(), Some(Role::User));
    }

    #[test]
    fn test_admin_login_replaces_identity() {
        let mut store = SessionStore::new();
        store.login_with_google(ann());
        store.login_admin(admin());

        let identity = store.identity().unwrap();
        assert!(store.is_logged_in());
        assert_eq!(identity.role, Role::Admin);
        assert!(!identity.is_google);
        assert_eq!(identity.email.as_str(), "admin@company.com");
        assert_eq!(store.known_users().len(), 2);
    }

    #[test]
    fn test_repeated_logins_keep_known_users_unique() {
        let mut store = SessionStore::new();
        for _ in 0..3 {
            store.login_with_google(ann());
            assert_consistent(&store);
            store.login_admin(admin());
            assert_consistent(&store);
            store.login_admin(ann());
            assert_consistent(&store);
        }
        assert_eq!(store.known_users().len(), 2);
    }

    #[test]
    fn test_role_follows_login_path() {
        let mut store = SessionStore::new();
        let sequence = [
            (true, ann()),
            (false, ann()),
            (false, admin()),
            (true, admin()),
        ];
        for (google, identity) in sequence {
            if google {
                store.login_with_google(identity);
                assert_eq!(store.role(), Some(Role::User));
            } else {
                store.login_admin(identity);
                assert_eq!(store.role(), Some(Role::Admin));
            }
            assert_consistent(&store);
        }
    }

    #[test]
    fn test_logout_is_idempotent() {
        let mut store = SessionStore::new();
        store.login_with_google(ann());
        store.set_login_error("stale");

        store.logout();
        let once = store.snapshot();
        store.logout();
        let twice = store.snapshot();

        assert_eq!(once, twice);
        assert!(!twice.is_logged_in);
        assert!(twice.identity.is_none());
        assert!(twice.login_error.is_none());
    }

    #[test]
    fn test_logout_keeps_known_users() {
        let mut store = SessionStore::new();
        store.login_with_google(ann());
        store.logout();
        assert_eq!(store.known_users().len(), 1);
    }

    #[test]
    fn test_login_error_set_and_cleared() {
        let mut store = SessionStore::new();
        store.set_login_error("Invalid admin credentials");
        assert!(!store.is_logged_in());
        assert_eq!(store.login_error(), Some("Invalid admin credentials"));

        store.login_admin(admin());
        assert!(store.login_error().is_none());

        store.set_login_error("later failure");
        assert!(store.is_logged_in(), "error does not touch the identity");
    }
}
