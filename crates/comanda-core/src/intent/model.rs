//! The closed intent set.

use serde::{Deserialize, Serialize};

use crate::order::{DeliveryMode, PaymentMethod};

/// An item reference extracted from a message, paired with its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuantity {
    pub key: String,
    pub quantity: u32,
}

/// The classified purpose of an inbound message within the current
/// conversation state.
///
/// Every variant carries its extracted entities; there is no escape hatch
/// into free-form interpretation. The external completion fallback is
/// mapped into this same set and can never produce the entity-carrying
/// variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Intent {
    Greet,
    AddItems(Vec<ItemQuantity>),
    RemoveItems(Vec<ItemQuantity>),
    Confirm,
    Cancel,
    Modify,
    ChooseDelivery(DeliveryMode),
    ChoosePayment(PaymentMethod),
    ProvideAddress(String),
    /// Free-text kitchen note captured during the modification sub-flow.
    Note(String),
    /// An alias matched more than one catalog entry; the customer must pick.
    AmbiguousItem {
        token: String,
        candidates: Vec<String>,
    },
    Unknown,
}
