//! Integration tests for login, restore and logout.
//!
//! The marketplace runs against [`MockBackend`] and persists into a
//! temporary state file, so restarts are simulated by building a second
//! marketplace over the same file.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use extickets_client::storage::{TOKEN_KEY, USER_KEY};
use extickets_client::{
    ClientConfig, ClientError, FileStore, KeyValueStore, Marketplace, Tab, ValidationError,
};
use extickets_core::Role;
use extickets_integration_tests::{DEFAULT_SERVER_TOKEN, DEFAULT_USER_EMAIL, MockBackend};
use secrecy::SecretString;
use serde_json::json;
use tempfile::TempDir;

fn marketplace(backend: &MockBackend, state_file: &Path) -> Marketplace {
    let config = ClientConfig::single_backend(backend.url(), state_file).unwrap();
    Marketplace::from_config(config).unwrap()
}

fn state_file(dir: &TempDir) -> PathBuf {
    dir.path().join("state").join("session.json")
}

fn secret(s: &str) -> SecretString {
    SecretString::from(s)
}

// =============================================================================
// Identity-provider login
// =============================================================================

#[tokio::test]
async fn test_google_login_persists_and_restores() {
    let backend = MockBackend::start().await.unwrap();
    let dir = TempDir::new().unwrap();
    let path = state_file(&dir);

    let market = marketplace(&backend, &path);
    let identity = market.login_with_google(&secret("id-123")).await.unwrap();
    assert_eq!(identity.email.as_str(), DEFAULT_USER_EMAIL);
    assert_eq!(identity.role, Role::User);
    assert!(identity.is_google);

    let requests = backend.requests_to("/auth/google");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].json, Some(json!({ "idToken": "id-123" })));

    let store = FileStore::new(&path);
    assert_eq!(
        store.get(TOKEN_KEY).unwrap().as_deref(),
        Some(DEFAULT_SERVER_TOKEN)
    );

    // Restart
    let restarted = marketplace(&backend, &path);
    assert!(!restarted.session().await.is_logged_in);
    let restored = restarted.restore().await.unwrap().unwrap();
    assert_eq!(restored, identity);

    let session = restarted.session().await;
    assert!(session.is_logged_in);
    assert_eq!(session.known_users.len(), 1);
    assert_eq!(restarted.profile().await.default_tab(), Some(Tab::Approved));
}

#[tokio::test]
async fn test_google_login_without_server_token_uses_id_token() {
    let backend = MockBackend::start().await.unwrap();
    backend.respond_to_google(
        200,
        json!({ "user": { "name": "Bo", "email": "bo@example.com" } }),
    );
    let dir = TempDir::new().unwrap();
    let market = marketplace(&backend, &state_file(&dir));

    market.login_with_google(&secret("id-xyz")).await.unwrap();
    market.refresh(Tab::MyTickets).await.unwrap();

    let listing = backend.requests_to("/api/tickets/user/");
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].raw_path, "/api/tickets/user/bo@example.com");
    assert_eq!(listing[0].authorization.as_deref(), Some("Bearer id-xyz"));
}

#[tokio::test]
async fn test_google_rejection_records_backend_message() {
    let backend = MockBackend::start().await.unwrap();
    backend.respond_to_google(401, json!({ "message": "Token expired" }));
    let dir = TempDir::new().unwrap();
    let path = state_file(&dir);
    let market = marketplace(&backend, &path);

    let err = market.login_with_google(&secret("id-old")).await.unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 401, .. }));

    let session = market.session().await;
    assert!(!session.is_logged_in);
    assert_eq!(session.login_error.as_deref(), Some("Token expired"));
    assert!(FileStore::new(&path).get(TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_google_response_without_email_is_rejected() {
    let backend = MockBackend::start().await.unwrap();
    backend.respond_to_google(200, json!({ "token": "srv", "name": "Ann" }));
    let dir = TempDir::new().unwrap();
    let market = marketplace(&backend, &state_file(&dir));

    let err = market.login_with_google(&secret("id-1")).await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
    assert!(!market.session().await.is_logged_in);
    assert!(market.session().await.login_error.is_some());
}

#[tokio::test]
async fn test_unreachable_auth_service_is_transport_error() {
    let dir = TempDir::new().unwrap();
    // Bind and release a port so nothing is listening on it.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let url = url::Url::parse(&format!("http://{addr}")).unwrap();

    let config = ClientConfig::single_backend(&url, &state_file(&dir)).unwrap();
    let market = Marketplace::from_config(config).unwrap();

    let err = market.login_with_google(&secret("id-1")).await.unwrap_err();
    assert!(matches!(err, ClientError::Http(_)));
    assert_eq!(
        market.session().await.login_error.as_deref(),
        Some("Could not reach the server. Please try again.")
    );
}

// =============================================================================
// Admin login
// =============================================================================

#[tokio::test]
async fn test_admin_login_sends_nothing() {
    let backend = MockBackend::start().await.unwrap();
    let dir = TempDir::new().unwrap();
    let market = marketplace(&backend, &state_file(&dir));

    let err = market
        .login_admin("admin", &secret("letmein"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Validation(ValidationError::InvalidAdminCredentials)
    ));

    let identity = market.login_admin("admin", &secret("admin123")).await.unwrap();
    assert!(identity.is_admin());
    assert!(market.session().await.login_error.is_none());

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_switching_identity_grows_known_users() {
    let backend = MockBackend::start().await.unwrap();
    let dir = TempDir::new().unwrap();
    let market = marketplace(&backend, &state_file(&dir));

    market.login_admin("admin", &secret("admin123")).await.unwrap();
    market.login_with_google(&secret("id-1")).await.unwrap();
    market.login_admin("admin", &secret("admin123")).await.unwrap();

    let session = market.session().await;
    assert_eq!(session.identity.unwrap().role, Role::Admin);
    let emails: Vec<&str> = session
        .known_users
        .iter()
        .map(|u| u.email.as_str())
        .collect();
    assert_eq!(emails, ["admin@company.com", DEFAULT_USER_EMAIL]);
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_clears_persisted_session() {
    let backend = MockBackend::start().await.unwrap();
    let dir = TempDir::new().unwrap();
    let path = state_file(&dir);
    let market = marketplace(&backend, &path);

    market.login_with_google(&secret("id-1")).await.unwrap();
    market.logout().await.unwrap();

    let store = FileStore::new(&path);
    assert!(store.get(TOKEN_KEY).unwrap().is_none());
    assert!(store.get(USER_KEY).unwrap().is_none());

    let session = market.session().await;
    assert!(!session.is_logged_in);
    assert!(session.identity.is_none());
    assert_eq!(session.known_users.len(), 1);

    let restarted = marketplace(&backend, &path);
    assert!(restarted.restore().await.unwrap().is_none());
}

#[tokio::test]
async fn test_logout_when_anonymous_is_noop() {
    let backend = MockBackend::start().await.unwrap();
    let dir = TempDir::new().unwrap();
    let market = marketplace(&backend, &state_file(&dir));

    market.logout().await.unwrap();
    let session = market.session().await;
    assert!(!session.is_logged_in);
    assert!(session.known_users.is_empty());
}
