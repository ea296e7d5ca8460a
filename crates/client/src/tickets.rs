//! Ticket cache: tickets created during this session.
//!
//! An append-only echo of successful uploads. It is independent of the list
//! shown on the board, which is replaced wholesale by every fetch.

use extickets_core::Ticket;

/// Tickets added in this process, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct TicketCache {
    tickets: Vec<Ticket>,
}

impl TicketCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a ticket. Duplicates are kept.
    pub fn add_ticket(&mut self, ticket: Ticket) {
        self.tickets.push(ticket);
    }

    #[must_use]
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}
