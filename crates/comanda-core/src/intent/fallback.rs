//! External completion-service fallback boundary.
//!
//! The fallback is advisory only: it may suggest a keyword-style intent when
//! the local rules come up empty, but it can never supply order-mutating
//! entities, and any transport failure is simply "no guess".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::ConversationState;

/// Context handed to the completion service.
#[derive(Debug, Clone, Serialize)]
pub struct FallbackContext {
    pub message: String,
    pub state: ConversationState,
}

/// Intent kinds the completion service may suggest.
///
/// Entity-carrying intents (items, quantities, addresses) are deliberately
/// absent; those always go through the local resolver and its validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuessKind {
    Greet,
    Confirm,
    Cancel,
    Modify,
    ChoosePickup,
    ChooseDelivery,
    PayCash,
    PayCard,
    PayTransfer,
    Unknown,
}

/// A guess returned by the completion service.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FallbackGuess {
    pub intent: GuessKind,
    pub confidence: f32,
}

/// An abstract client for the completion-service fallback.
///
/// # Implementation Notes
///
/// Implementations must bound the call with a timeout and make a single
/// attempt; `guess` never blocks a session indefinitely and never retries
/// inline. Errors of any kind map to `None`.
#[async_trait]
pub trait FallbackClassifier: Send + Sync {
    async fn guess(&self, context: &FallbackContext) -> Option<FallbackGuess>;
}

/// Fallback used when the external service is disabled.
pub struct NoopFallback;

#[async_trait]
impl FallbackClassifier for NoopFallback {
    async fn guess(&self, _context: &FallbackContext) -> Option<FallbackGuess> {
        None
    }
}
