//! Subcommand implementations.
//!
//! Commands write into a buffer; `main` prints it once the command succeeded.

pub mod session;
pub mod tickets;

use std::io::Write;
use std::path::PathBuf;

use extickets_client::{ClientConfig, ClientError, Marketplace};
use thiserror::Error;

/// Errors surfaced to the person running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{}", .0.user_message())]
    Client(#[from] ClientError),

    #[error("Could not read {path}: {source}")]
    Attachment {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Build the marketplace and pick up the session saved by an earlier run.
///
/// # Errors
///
/// Returns error if the HTTP client fails to build.
pub async fn open(config: ClientConfig) -> Result<Marketplace, ClientError> {
    let market = Marketplace::from_config(config)?;
    if let Err(e) = market.restore().await {
        tracing::warn!(error = %e, "Saved session could not be restored");
    }
    Ok(market)
}

/// Print command output to stdout.
///
/// # Errors
///
/// Returns error if stdout is closed.
pub fn emit(out: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(out.as_bytes())?;
    stdout.flush()
}
