//! Integration tests for the ExTickets client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p extickets-integration-tests
//! ```
//!
//! No external services are needed. [`MockBackend`] serves the auth, ticket
//! and review routes from an in-process axum router bound to `127.0.0.1:0`,
//! records every request it sees, and answers with whatever a test scripted.
//!
//! # Test Categories
//!
//! - `session_flow` - login, restore, logout against the mock auth route
//! - `ticket_flow` - listing, review and upload

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl FormField {
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// A request as the backend received it.
#[derive(Debug, Clone, Default)]
pub struct RecordedRequest {
    pub method: String,
    /// Path as sent, still percent-encoded.
    pub raw_path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub json: Option<Value>,
    pub form: BTreeMap<String, FormField>,
    /// Decoded `{comment}` segment of a `changeStatus` call.
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
struct Scripted {
    status: StatusCode,
    body: Value,
}

#[derive(Debug, Default)]
struct Script {
    google: Option<Scripted>,
    listings: HashMap<String, Value>,
    list_delay: Duration,
    review: Option<Scripted>,
    review_delay: Duration,
    upload: Option<Scripted>,
    uploads: u32,
}

#[derive(Debug, Default)]
struct Shared {
    requests: Mutex<Vec<RecordedRequest>>,
    script: Mutex<Script>,
}

impl Shared {
    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, request: RecordedRequest) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
    }
}

/// In-process stand-in for the ExTickets backend.
///
/// Unscripted routes answer like a healthy backend: the auth route returns a
/// fixed user, listings are empty, reviews succeed, uploads echo the form
/// back as a created ticket. The server stops when the value drops.
#[derive(Debug)]
pub struct MockBackend {
    url: Url,
    shared: Arc<Shared>,
    server: JoinHandle<()>,
}

/// Email of the user the unscripted auth route logs in.
pub const DEFAULT_USER_EMAIL: &str = "ann@example.com";

/// Bearer token the unscripted auth route issues.
pub const DEFAULT_SERVER_TOKEN: &str = "server-token";

impl MockBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let shared = Arc::new(Shared::default());
        let app = Router::new()
            .route("/auth/google", post(google))
            .route("/api/admin/tickets/status/{status}", get(list_by_status))
            .route("/api/tickets/user/{email}", get(list_by_user))
            .route(
                "/api/admin/tickets/ticket/{id}/changeStatus/{status}/comments/{comment}",
                post(change_status),
            )
            .route("/api/tickets/upload", post(upload))
            .with_state(Arc::clone(&shared));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let url = Url::parse(&format!("http://{addr}")).map_err(std::io::Error::other)?;

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            url,
            shared,
            server,
        })
    }

    /// Base URL serving every route.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests whose raw path starts with `prefix`.
    #[must_use]
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.raw_path.starts_with(prefix))
            .collect()
    }

    /// Answer `POST /auth/google` with `status` and `body`.
    pub fn respond_to_google(&self, status: u16, body: Value) {
        self.shared.script().google = Some(scripted(status, body));
    }

    /// Serve `body` from `GET /api/admin/tickets/status/{status}`.
    pub fn set_status_listing(&self, status: &str, body: Value) {
        self.shared
            .script()
            .listings
            .insert(format!("status/{status}"), body);
    }

    /// Serve `body` from `GET /api/tickets/user/{email}`.
    pub fn set_user_listing(&self, email: &str, body: Value) {
        self.shared
            .script()
            .listings
            .insert(format!("user/{email}"), body);
    }

    /// Hold every listing response for `delay`.
    pub fn delay_listings(&self, delay: Duration) {
        self.shared.script().list_delay = delay;
    }

    /// Hold every review response for `delay`.
    pub fn delay_reviews(&self, delay: Duration) {
        self.shared.script().review_delay = delay;
    }

    /// Answer every review with `status` and `body`.
    pub fn respond_to_reviews(&self, status: u16, body: Value) {
        self.shared.script().review = Some(scripted(status, body));
    }

    /// Answer every upload with `status` and `body`.
    pub fn respond_to_uploads(&self, status: u16, body: Value) {
        self.shared.script().upload = Some(scripted(status, body));
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn scripted(status: u16, body: Value) -> Scripted {
    Scripted {
        status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        body,
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn recorded(method: &str, uri: &Uri, headers: &HeaderMap) -> RecordedRequest {
    RecordedRequest {
        method: method.to_owned(),
        raw_path: uri.path().to_owned(),
        authorization: header_value(headers, header::AUTHORIZATION),
        content_type: header_value(headers, header::CONTENT_TYPE),
        ..RecordedRequest::default()
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Missing bearer token" })),
    )
        .into_response()
}

fn is_bearer(request: &RecordedRequest) -> bool {
    request
        .authorization
        .as_deref()
        .is_some_and(|v| v.starts_with("Bearer ") && v.len() > "Bearer ".len())
}

fn id_of(ticket: &Value) -> Option<String> {
    match ticket.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

async fn google(
    State(shared): State<Arc<Shared>>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut request = recorded("POST", &uri, &headers);
    request.json = Some(body);
    shared.record(request);

    match shared.script().google.clone() {
        Some(Scripted { status, body }) => (status, Json(body)).into_response(),
        None => Json(json!({
            "token": DEFAULT_SERVER_TOKEN,
            "name": "Ann",
            "email": DEFAULT_USER_EMAIL,
        }))
        .into_response(),
    }
}

async fn list_by_status(
    State(shared): State<Arc<Shared>>,
    Path(status): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    listing(&shared, format!("status/{status}"), &uri, &headers).await
}

async fn list_by_user(
    State(shared): State<Arc<Shared>>,
    Path(email): Path<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    listing(&shared, format!("user/{email}"), &uri, &headers).await
}

async fn listing(shared: &Shared, key: String, uri: &Uri, headers: &HeaderMap) -> Response {
    let request = recorded("GET", uri, headers);
    let authorized = is_bearer(&request);
    shared.record(request);

    let delay = shared.script().list_delay;
    tokio::time::sleep(delay).await;

    if !authorized {
        return unauthorized();
    }
    let body = shared
        .script()
        .listings
        .get(&key)
        .cloned()
        .unwrap_or_else(|| json!([]));
    Json(body).into_response()
}

async fn change_status(
    State(shared): State<Arc<Shared>>,
    Path((id, _status, comment)): Path<(String, String, String)>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let mut request = recorded("POST", &uri, &headers);
    request.comment = Some(comment);
    let authorized = is_bearer(&request);
    shared.record(request);

    let delay = shared.script().review_delay;
    tokio::time::sleep(delay).await;

    if !authorized {
        return unauthorized();
    }
    let mut script = shared.script();
    if let Some(Scripted { status, body }) = script.review.clone() {
        return (status, Json(body)).into_response();
    }

    // A reviewed ticket leaves the in-review listing.
    if let Some(Value::Array(tickets)) = script.listings.get_mut("status/in-review") {
        tickets.retain(|t| id_of(t).as_deref() != Some(id.as_str()));
    }
    Json(json!({ "message": "Status updated" })).into_response()
}

async fn upload(
    State(shared): State<Arc<Shared>>,
    uri: Uri,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut request = recorded("POST", &uri, &headers);
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "message": format!("Multipart error: {e}") })),
                )
                    .into_response();
            }
        };
        let name = field.name().unwrap_or_default().to_owned();
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let Ok(data) = field.bytes().await else {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Failed to read field" })),
            )
                .into_response();
        };
        request.form.insert(
            name,
            FormField {
                file_name,
                content_type,
                data: data.to_vec(),
            },
        );
    }

    let authorized = is_bearer(&request);
    let form = request.form.clone();
    shared.record(request);
    if !authorized {
        return unauthorized();
    }

    let mut script = shared.script();
    if let Some(Scripted { status, body }) = script.upload.clone() {
        return (status, Json(body)).into_response();
    }

    script.uploads += 1;
    let text = |key: &str| form.get(key).map(FormField::text).unwrap_or_default();
    let stored = |key: &str| {
        form.get(key)
            .and_then(|f| f.file_name.clone())
            .map(|name| format!("/uploads/{name}"))
    };
    let price = text("price").parse::<f64>().unwrap_or_default();

    (
        StatusCode::CREATED,
        Json(json!({
            "id": format!("t-{}", script.uploads),
            "eventName": text("eventName"),
            "eventDateTime": text("eventDateTime"),
            "venue": text("venue"),
            "price": price,
            "userEmail": DEFAULT_USER_EMAIL,
            "eventImagePath": stored("eventImage"),
            "filePath": stored("file"),
            "status": "in-review",
        })),
    )
        .into_response()
}
