//! Transport-boundary message types.
//!
//! This is the whole contract with the messaging transport: it hands in
//! `(customer id, text, timestamp)` and gets back zero-or-more outbound
//! texts. Delivery and retry semantics stay on the transport's side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One inbound customer message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub customer_id: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// One outbound reply to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub customer_id: String,
    pub text: String,
}
