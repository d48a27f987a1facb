//! Confirmed-order sink trait.
//!
//! Defines the hand-off boundary to the persistence/printing collaborator.

use async_trait::async_trait;

use super::snapshot::OrderSnapshot;
use crate::error::Result;

/// An abstract sink for confirmed orders.
///
/// The conversation core calls this at most once per confirmation event.
/// Implementations decide what "persist" means (ticket files, a printer
/// spool, a remote API); a failure leaves the order confirmed on the
/// session side and is retried only through an explicit trigger.
#[async_trait]
pub trait OrderSink: Send + Sync {
    /// Delivers a finalized order snapshot downstream.
    ///
    /// # Returns
    ///
    /// The assigned ticket number. When the snapshot already carries a
    /// number (a modified re-confirmation), that number is reused.
    async fn deliver(&self, snapshot: &OrderSnapshot) -> Result<u64>;
}
