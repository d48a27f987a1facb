//! Per-customer conversation session.

use chrono::{DateTime, Duration, Utc};

use super::state::ConversationState;
use crate::order::{Order, OrderSnapshot};

/// One customer's conversation and its exclusively-owned order.
///
/// Created on the first inbound message from a customer id; replaced by a
/// fresh session once it becomes archivable. No two sessions ever share an
/// order.
#[derive(Debug, Clone)]
pub struct CustomerSession {
    /// Channel-assigned customer identifier, the registry key.
    pub customer_id: String,
    pub state: ConversationState,
    pub order: Order,
    /// Ticket number assigned by the sink on the first successful hand-off.
    /// Reused for modified re-confirmations.
    pub ticket_number: Option<u64>,
    /// Whether the latest confirmation event reached the sink.
    pub handed_off: bool,
    /// Snapshot waiting for an explicit hand-off retry after a sink failure.
    pub pending_handoff: Option<OrderSnapshot>,
    pub last_activity: DateTime<Utc>,
}

impl CustomerSession {
    pub fn new(customer_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            customer_id: customer_id.into(),
            state: ConversationState::Idle,
            order: Order::new(),
            ticket_number: None,
            handed_off: false,
            pending_handoff: None,
            last_activity: now,
        }
    }

    /// Whether the registry may replace this session with a fresh one.
    ///
    /// A confirmed session with a failed hand-off is never archivable; the
    /// order must stay reachable for the explicit retry trigger.
    pub fn is_archivable(&self, now: DateTime<Utc>, idle_timeout: Duration) -> bool {
        match self.state {
            ConversationState::Cancelled => true,
            ConversationState::Confirmed => {
                self.handed_off && now - self.last_activity >= idle_timeout
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_sessions_are_always_archivable() {
        let now = Utc::now();
        let mut session = CustomerSession::new("c1", now);
        session.state = ConversationState::Cancelled;
        assert!(session.is_archivable(now, Duration::minutes(20)));
    }

    #[test]
    fn confirmed_sessions_archive_only_after_the_idle_window() {
        let now = Utc::now();
        let mut session = CustomerSession::new("c1", now);
        session.state = ConversationState::Confirmed;
        session.handed_off = true;

        assert!(!session.is_archivable(now + Duration::minutes(5), Duration::minutes(20)));
        assert!(session.is_archivable(now + Duration::minutes(20), Duration::minutes(20)));
    }

    #[test]
    fn failed_handoff_blocks_archiving() {
        let now = Utc::now();
        let mut session = CustomerSession::new("c1", now);
        session.state = ConversationState::Confirmed;
        session.handed_off = false;
        assert!(!session.is_archivable(now + Duration::minutes(60), Duration::minutes(20)));
    }
}
