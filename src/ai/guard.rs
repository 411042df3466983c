//! Staleness guard for advisory results.
//!
//! Advisory calls cannot be cancelled once sent. A view context takes a
//! [`Ticket`] before calling and applies the result only if the ticket is
//! still current; bumping the [`Generation`] (leaving the view, switching
//! project) makes every outstanding ticket stale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A generation counter. Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    current: Arc<AtomicU64>,
}

/// Snapshot of a generation taken when a request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for a request issued now.
    pub fn ticket(&self) -> Ticket {
        Ticket(self.current.load(Ordering::SeqCst))
    }

    /// Invalidate every outstanding ticket.
    pub fn bump(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }

    /// Run `apply` only if `ticket` is still current. Returns whether it ran.
    pub fn apply_if_current(&self, ticket: Ticket, apply: impl FnOnce()) -> bool {
        if self.is_current(ticket) {
            apply();
            true
        } else {
            tracing::debug!(ticket = ticket.0, "Discarding stale advisory result");
            false
        }
    }
}
