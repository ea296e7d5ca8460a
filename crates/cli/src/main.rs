//! ExTickets CLI - log in, browse, review and upload tickets.
//!
//! # Usage
//!
//! ```bash
//! # Log in with an identity-provider ID token
//! extickets login google --id-token eyJhbGciOi...
//!
//! # Log in as the admin
//! extickets login admin -u admin -p admin123
//!
//! # Show the current session
//! extickets whoami
//!
//! # List tickets (defaults to the first tab of the current role)
//! extickets list --tab mine
//!
//! # Review
//! extickets approve 42
//! extickets reject 42 --comment "Duplicate listing"
//!
//! # Upload
//! extickets upload --event-name "Gig" --date 2025-06-01T19:30 --venue "Hall" \
//!     --price 25.50 --image poster.png --file ticket.pdf
//! ```
//!
//! The session is saved between runs; see `ClientConfig` for the environment
//! variables. Logs go to stderr (`RUST_LOG`, `EXTICKETS_LOG_FORMAT=json`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use extickets_client::{ClientConfig, Tab};
use extickets_core::{EventDateTime, Price};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "extickets")]
#[command(author, version, about = "ExTickets marketplace client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in
    Login {
        #[command(subcommand)]
        method: LoginMethod,
    },
    /// Log out and forget the saved session
    Logout,
    /// Show who is logged in
    Whoami,
    /// List tickets
    List {
        /// Which listing to show (defaults to the role's first tab)
        #[arg(short, long, value_enum)]
        tab: Option<TabArg>,
    },
    /// Approve a ticket in review (admin)
    Approve {
        /// Ticket ID
        id: String,

        /// Review comment
        #[arg(short, long)]
        comment: Option<String>,
    },
    /// Reject a ticket in review (admin)
    Reject {
        /// Ticket ID
        id: String,

        /// Reason for the rejection
        #[arg(short, long)]
        comment: String,
    },
    /// Upload a ticket for review (user)
    Upload {
        /// Event name
        #[arg(long)]
        event_name: String,

        /// Event date and time, e.g. `2025-06-01T19:30`
        #[arg(long, value_parser = parse_date)]
        date: EventDateTime,

        /// Venue
        #[arg(long)]
        venue: String,

        /// Price
        #[arg(long, value_parser = parse_price)]
        price: Price,

        /// Event image
        #[arg(long)]
        image: PathBuf,

        /// Ticket PDF
        #[arg(long)]
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum LoginMethod {
    /// Exchange an identity-provider ID token
    Google {
        /// ID token issued by the identity provider
        #[arg(long)]
        id_token: String,
    },
    /// Log in with the admin username and password
    Admin {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TabArg {
    Approved,
    Mine,
    InReview,
}

impl From<TabArg> for Tab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::Approved => Self::Approved,
            TabArg::Mine => Self::MyTickets,
            TabArg::InReview => Self::InReview,
        }
    }
}

fn parse_date(s: &str) -> Result<EventDateTime, String> {
    EventDateTime::parse(s).map_err(|e| e.to_string())
}

fn parse_price(s: &str) -> Result<Price, String> {
    Price::parse(s).map_err(|e| e.to_string())
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "extickets=info".into());

    // Stdout carries command output, so logs go to stderr.
    let json = std::env::var("EXTICKETS_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env();

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let market = commands::open(config).await?;
    let mut out = String::new();

    match cli.command {
        Commands::Login { method } => match method {
            LoginMethod::Google { id_token } => {
                commands::session::login_google(&market, id_token, &mut out).await?;
            }
            LoginMethod::Admin { username, password } => {
                commands::session::login_admin(&market, &username, password, &mut out).await?;
            }
        },
        Commands::Logout => commands::session::logout(&market, &mut out).await?,
        Commands::Whoami => commands::session::whoami(&market, &mut out).await,
        Commands::List { tab } => {
            commands::tickets::list(&market, tab.map(Tab::from), &mut out).await?;
        }
        Commands::Approve { id, comment } => {
            commands::tickets::approve(&market, &id, comment.as_deref(), &mut out).await?;
        }
        Commands::Reject { id, comment } => {
            commands::tickets::reject(&market, &id, &comment, &mut out).await?;
        }
        Commands::Upload {
            event_name,
            date,
            venue,
            price,
            image,
            file,
        } => {
            let form = commands::tickets::UploadArgs {
                event_name,
                date,
                venue,
                price,
                image,
                file,
            };
            commands::tickets::upload(&market, form, &mut out).await?;
        }
    }

    commands::emit(&out)?;
    Ok(())
}
