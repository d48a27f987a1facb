//! Finalized order records for the downstream hand-off.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::model::{DeliveryMode, PaymentMethod};

/// One display line of a finalized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLine {
    pub display_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// The immutable record handed to the persistence/printing collaborator,
/// emitted exactly once per confirmation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub customer_id: String,
    /// Ticket number from a previous confirmation of the same order, if
    /// this is a modified re-confirmation. The sink assigns a fresh number
    /// when absent.
    pub ticket_number: Option<u64>,
    pub lines: Vec<SnapshotLine>,
    pub items_total: Decimal,
    /// Present only for delivery orders.
    pub delivery_fee: Option<Decimal>,
    pub grand_total: Decimal,
    pub delivery: DeliveryMode,
    pub address: Option<String>,
    pub payment: PaymentMethod,
    pub notes: Vec<String>,
    /// True when this snapshot replaces an already-printed ticket.
    pub modified: bool,
    pub confirmed_at: DateTime<Utc>,
}
