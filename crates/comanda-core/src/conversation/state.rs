//! Conversation states for the ordering journey.

use serde::{Deserialize, Serialize};

/// Where a session currently sits in the ordering journey.
///
/// `Cancelled` is terminal for the order lifecycle; `Confirmed` becomes
/// terminal once the configured inactivity window passes without further
/// messages and the registry archives the session. A later message from the
/// same customer starts a fresh session at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum ConversationState {
    Idle,
    Greeted,
    BuildingOrder,
    AwaitingDeliveryChoice,
    AwaitingAddress,
    AwaitingPayment,
    AwaitingConfirmation,
    Confirmed,
    Modifying,
    Cancelled,
}

impl ConversationState {
    /// True once no further message can advance the order.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationState::Cancelled)
    }
}
