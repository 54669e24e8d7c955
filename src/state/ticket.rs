//! Sequence numbers for in-flight collaborator calls.

use std::fmt;

/// Identifies one issued request. Later tickets compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Raw sequence number.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues monotonically increasing tickets and remembers the latest one
/// still outstanding for a single slot.
#[derive(Debug, Default)]
pub struct TicketSlot {
    issued: u64,
    outstanding: Option<Ticket>,
}

impl TicketSlot {
    /// Issue a new ticket, superseding any outstanding one.
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        let ticket = Ticket(self.issued);
        self.outstanding = Some(ticket);
        ticket
    }

    /// Accept `ticket` if it is the outstanding one, clearing the slot.
    ///
    /// Returns `false` for superseded or already-settled tickets.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if self.outstanding == Some(ticket) {
            self.outstanding = None;
            true
        } else {
            false
        }
    }

    /// Whether a ticket is waiting to be settled.
    pub fn is_outstanding(&self) -> bool {
        self.outstanding.is_some()
    }
}
