//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `EXTICKETS_API_URL` - Ticket API base URL (default: `http://localhost:8080`)
//! - `EXTICKETS_AUTH_URL` - Auth service base URL (default: `http://localhost:8081`)
//! - `EXTICKETS_REVIEW_URL` - Review service base URL for status changes
//!   (default: same as `EXTICKETS_API_URL`)
//! - `EXTICKETS_ADMIN_USERNAME` - Admin login name (default: `admin`)
//! - `EXTICKETS_ADMIN_PASSWORD` - Admin login password (default: `admin123`)
//! - `EXTICKETS_ADMIN_EMAIL` - Email the admin identity carries
//!   (default: `admin@company.com`)
//! - `EXTICKETS_STATE_FILE` - Path of the persisted session file
//!   (default: `<platform data dir>/session.json`)
//! - `EXTICKETS_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use extickets_core::Email;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_AUTH_URL: &str = "http://localhost:8081";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_ADMIN_EMAIL: &str = "admin@company.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const STATE_FILE_NAME: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("No platform data directory; set EXTICKETS_STATE_FILE")]
    NoDataDir,
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the ticket API (`/api/tickets/...`, `/api/admin/...`)
    pub api_url: Url,
    /// Base URL of the auth service (`/auth/google`)
    pub auth_url: Url,
    /// Base URL used for `changeStatus` calls
    pub review_url: Url,
    /// Admin credential pair checked before the admin login is dispatched
    pub admin: AdminCredentials,
    /// Where the bearer token and identity are persisted
    pub state_file: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Fixed admin username/password pair, and the email the admin identity uses.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: SecretString,
    pub email: Email,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("email", &self.email)
            .finish()
    }
}

impl AdminCredentials {
    /// Check a submitted username/password against this pair.
    #[must_use]
    pub fn matches(&self, username: &str, password: &SecretString) -> bool {
        let expected = self.password.expose_secret().as_bytes();
        let given = password.expose_secret().as_bytes();
        // Constant time over equal-length inputs.
        let password_ok = expected.len() == given.len()
            && expected
                .iter()
                .zip(given)
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0;
        self.username == username && password_ok
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but malformed, or if no state
    /// file path can be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = parse_url(&lookup, "EXTICKETS_API_URL", DEFAULT_API_URL)?;
        let auth_url = parse_url(&lookup, "EXTICKETS_AUTH_URL", DEFAULT_AUTH_URL)?;
        let review_url = match lookup("EXTICKETS_REVIEW_URL") {
            Some(raw) => parse_url_value("EXTICKETS_REVIEW_URL", &raw)?,
            None => api_url.clone(),
        };

        let raw_email =
            lookup("EXTICKETS_ADMIN_EMAIL").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_owned());
        let admin = AdminCredentials {
            username: lookup("EXTICKETS_ADMIN_USERNAME")
                .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_owned()),
            password: SecretString::from(
                lookup("EXTICKETS_ADMIN_PASSWORD")
                    .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_owned()),
            ),
            email: Email::parse(&raw_email).map_err(|e| {
                ConfigError::InvalidEnvVar("EXTICKETS_ADMIN_EMAIL".to_string(), e.to_string())
            })?,
        };

        let state_file = match lookup("EXTICKETS_STATE_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_state_file()?,
        };

        let timeout_secs = match lookup("EXTICKETS_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("EXTICKETS_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            auth_url,
            review_url,
            admin,
            state_file,
            timeout: Duration::from_secs(timeout_secs),
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
        })
    }

    /// Configuration pointing every service at one base URL, defaults elsewhere.
    ///
    /// Used by tests and local setups where a single backend serves all routes.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` is not an http(s) URL.
    pub fn single_backend(base: &Url, state_file: &Path) -> Result<Self, ConfigError> {
        let base = base.to_string();
        let state_file = state_file.to_string_lossy().into_owned();
        Self::from_lookup(|key| match key {
            "EXTICKETS_API_URL" | "EXTICKETS_AUTH_URL" => Some(base.clone()),
            "EXTICKETS_STATE_FILE" => Some(state_file.clone()),
            _ => None,
        })
    }
}

fn parse_url<F>(lookup: &F, key: &str, default: &str) -> Result<Url, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_owned());
    parse_url_value(key, &raw)
}

fn parse_url_value(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }
    Ok(url)
}

fn default_state_file() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("com", "extickets", "extickets").ok_or(ConfigError::NoDataDir)?;
    Ok(dirs.data_dir().join(STATE_FILE_NAME))
}
