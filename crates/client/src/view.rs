//! Role-conditional home view.
//!
//! One view serves guests, users and admins. [`ViewProfile`] lists what each
//! role can see and do; [`TicketBoard`] holds the list the last fetch
//! returned; [`render_ticket`] formats a ticket card for that profile.

use std::fmt::Write as _;

use extickets_core::{Identity, Role, Ticket};

/// One listing the home view can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    /// Tickets approved for sale (users).
    Approved,
    /// The logged-in user's own tickets.
    MyTickets,
    /// Tickets waiting for review (admins).
    InReview,
}

impl Tab {
    /// Section heading shown above the list.
    #[must_use]
    pub const fn heading(&self) -> &'static str {
        match self {
            Self::Approved => "Approved Tickets",
            Self::MyTickets => "My Tickets",
            Self::InReview => "New Tickets (In-Review)",
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::MyTickets => write!(f, "mine"),
            Self::InReview => write!(f, "in-review"),
        }
    }
}

/// What a role sees on the home view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewProfile {
    pub role: Option<Role>,
    pub tabs: &'static [Tab],
    pub can_upload: bool,
    pub can_review: bool,
    /// Show "Posted By" on ticket cards.
    pub shows_owner: bool,
}

const GUEST_TABS: &[Tab] = &[];
const USER_TABS: &[Tab] = &[Tab::Approved, Tab::MyTickets];
const ADMIN_TABS: &[Tab] = &[Tab::InReview];

impl ViewProfile {
    /// Profile for a role, or for a guest when `None`.
    #[must_use]
    pub const fn for_role(role: Option<Role>) -> Self {
        match role {
            None => Self {
                role: None,
                tabs: GUEST_TABS,
                can_upload: false,
                can_review: false,
                shows_owner: false,
            },
            Some(Role::User) => Self {
                role,
                tabs: USER_TABS,
                can_upload: true,
                can_review: false,
                shows_owner: false,
            },
            Some(Role::Admin) => Self {
                role,
                tabs: ADMIN_TABS,
                can_upload: false,
                can_review: true,
                shows_owner: true,
            },
        }
    }

    /// Tab opened when the view first loads.
    #[must_use]
    pub fn default_tab(&self) -> Option<Tab> {
        self.tabs.first().copied()
    }

    #[must_use]
    pub fn allows(&self, tab: Tab) -> bool {
        self.tabs.contains(&tab)
    }

    /// `Welcome, <name>` or `Welcome, Guest`.
    #[must_use]
    pub fn greeting(identity: Option<&Identity>) -> String {
        let name = identity.map_or("Guest", |i| i.name.as_str());
        format!("Welcome, {name}")
    }
}

/// The list shown on the home view.
///
/// Every fetch replaces the list. A fetch started before the most recent
/// [`invalidate`](Self::invalidate) is stale and its result is dropped.
#[derive(Debug, Clone, Default)]
pub struct TicketBoard {
    tab: Option<Tab>,
    tickets: Vec<Ticket>,
    epoch: u64,
}

/// Handle for one fetch, tying its result to the board state it started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct FetchTicket {
    tab: Tab,
    epoch: u64,
}

impl FetchTicket {
    #[must_use]
    pub const fn tab(&self) -> Tab {
        self.tab
    }
}

impl TicketBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch for `tab`. Starting a new fetch makes earlier ones stale.
    pub fn begin(&mut self, tab: Tab) -> FetchTicket {
        self.epoch += 1;
        FetchTicket {
            tab,
            epoch: self.epoch,
        }
    }

    /// Install a fetch result. Returns `false` and leaves the board alone if
    /// the fetch is stale.
    pub fn apply(&mut self, fetch: FetchTicket, tickets: Vec<Ticket>) -> bool {
        if fetch.epoch != self.epoch {
            return false;
        }
        self.tab = Some(fetch.tab);
        self.tickets = tickets;
        true
    }

    /// Clear the board and make every in-flight fetch stale.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
        self.tab = None;
        self.tickets.clear();
    }

    #[must_use]
    pub const fn tab(&self) -> Option<Tab> {
        self.tab
    }

    #[must_use]
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }
}

/// Format one ticket card.
#[must_use]
pub fn render_ticket(ticket: &Ticket, profile: &ViewProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", ticket.event_name);
    if let Some(id) = &ticket.id {
        let _ = writeln!(out, "  ID: {id}");
    }
    let _ = writeln!(out, "  Date: {}", ticket.event_date_time.display());
    let _ = writeln!(out, "  Venue: {}", ticket.venue);
    let _ = writeln!(out, "  Price: ${}", ticket.price);
    if let Some(status) = ticket.status {
        let _ = writeln!(out, "  Status: {status}");
    }
    if profile.shows_owner
        && let Some(owner) = &ticket.user_email
    {
        let _ = writeln!(out, "  Posted By: {owner}");
    }
    if profile.can_review && ticket.is_in_review() {
        let _ = writeln!(out, "  Actions: approve | reject");
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use extickets_core::{Email, EventDateTime, Price, TicketId, TicketStatus};

    use super::*;

    fn ticket() -> Ticket {
        let mut t = Ticket::new(
            "Gig",
            EventDateTime::parse("2025-06-01T19:30").unwrap(),
            "Hall",
            Price::from(10),
        );
        t.id = Some(TicketId::new("t1"));
        t.user_email = Some(Email::parse("ann@x.com").unwrap());
        t.status = Some(TicketStatus::InReview);
        t
    }

    #[test]
    fn test_profiles_per_role() {
        let guest = ViewProfile::for_role(None);
        assert!(guest.tabs.is_empty());
        assert_eq!(guest.default_tab(), None);

        let user = ViewProfile::for_role(Some(Role::User));
        assert!(user.can_upload && !user.can_review && !user.shows_owner);
        assert_eq!(user.default_tab(), Some(Tab::Approved));
        assert!(user.allows(Tab::MyTickets));
        assert!(!user.allows(Tab::InReview));

        let admin = ViewProfile::for_role(Some(Role::Admin));
        assert!(!admin.can_upload && admin.can_review && admin.shows_owner);
        assert_eq!(admin.default_tab(), Some(Tab::InReview));
        assert!(!admin.allows(Tab::Approved));
    }

    #[test]
    fn test_greeting() {
        assert_eq!(ViewProfile::greeting(None), "Welcome, Guest");
        let ann = Identity::new("Ann", Email::parse("ann@x.com").unwrap());
        assert_eq!(ViewProfile::greeting(Some(&ann)), "Welcome, Ann");
    }

    #[test]
    fn test_board_replaces_on_apply() {
        let mut board = TicketBoard::new();
        let fetch = board.begin(Tab::Approved);
        assert!(board.apply(fetch, vec![ticket(), ticket()]));
        assert_eq!(board.tickets().len(), 2);

        let fetch = board.begin(Tab::MyTickets);
        assert!(board.apply(fetch, vec![ticket()]));
        assert_eq!(board.tickets().len(), 1);
        assert_eq!(board.tab(), Some(Tab::MyTickets));
    }

    #[test]
    fn test_board_drops_stale_results() {
        let mut board = TicketBoard::new();
        let first = board.begin(Tab::Approved);
        let second = board.begin(Tab::MyTickets);
        assert!(!board.apply(first, vec![ticket()]));
        assert!(board.tickets().is_empty());
        assert!(board.apply(second, vec![]));
        assert_eq!(board.tab(), Some(Tab::MyTickets));
    }

    #[test]
    fn test_board_invalidate_discards_in_flight() {
        let mut board = TicketBoard::new();
        let fetch = board.begin(Tab::InReview);
        board.invalidate();
        assert!(!board.apply(fetch, vec![ticket()]));
        assert!(board.tickets().is_empty());
        assert_eq!(board.tab(), None);
    }

    #[test]
    fn test_render_for_admin_shows_owner_and_actions() {
        let card = render_ticket(&ticket(), &ViewProfile::for_role(Some(Role::Admin)));
        assert!(card.starts_with("Gig\n"));
        assert!(card.contains("Date: 2025-06-01 19:30"));
        assert!(card.contains("Price: $10"));
        assert!(card.contains("Status: in-review"));
        assert!(card.contains("Posted By: ann@x.com"));
        assert!(card.contains("Actions: approve | reject"));
    }

    #[test]
    fn test_render_for_user_hides_admin_fields() {
        let card = render_ticket(&ticket(), &ViewProfile::for_role(Some(Role::User)));
        assert!(card.contains("Venue: Hall"));
        assert!(!card.contains("Posted By"));
        assert!(!card.contains("Actions"));
    }
}
