//! Error types shared across the comanda workspace.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::OrderStatus;

/// A required field still absent from an order at confirmation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingField {
    /// The order has no lines.
    Items,
    /// Neither pickup nor delivery was chosen.
    DeliveryMode,
    /// Delivery was chosen but no address was given.
    Address,
    /// No payment method was chosen.
    PaymentMethod,
}

impl MissingField {
    /// Customer-facing wording used in corrective prompts.
    pub fn prompt_name(&self) -> &'static str {
        match self {
            MissingField::Items => "los productos del pedido",
            MissingField::DeliveryMode => "si es envío o retiro",
            MissingField::Address => "la dirección de entrega",
            MissingField::PaymentMethod => "el medio de pago",
        }
    }
}

/// A shared error type for the entire comanda workspace.
///
/// Provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ComandaError {
    /// Malformed catalog source data. Fatal at startup, never per-message.
    #[error("catalog load failed ({source_name}, line {line}): {message}")]
    CatalogLoad {
        source_name: String,
        line: usize,
        message: String,
    },

    /// An item key that does not exist in the catalog.
    #[error("unknown item '{key}'")]
    UnknownItem { key: String },

    /// Removal was requested for an item that is not on the order.
    #[error("item '{key}' is not in the order")]
    NotInOrder { key: String },

    /// Confirmation was attempted while a required field is missing.
    #[error("order incomplete: missing {missing:?}")]
    IncompleteOrder { missing: MissingField },

    /// The completion-service fallback did not answer within its deadline.
    #[error("intent classification fallback timed out")]
    ClassificationTimeout,

    /// Hand-off of a confirmed order to the downstream sink failed.
    #[error("order hand-off failed: {0}")]
    PersistenceHandoff(String),

    /// Mutation was attempted on an order that is no longer a draft.
    #[error("order is {status:?} and can no longer be edited")]
    OrderClosed { status: OrderStatus },

    /// IO error (file system operations).
    #[error("IO error: {message}")]
    Io { message: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ComandaError {
    /// Creates a CatalogLoad error.
    pub fn catalog_load(
        source_name: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::CatalogLoad {
            source_name: source_name.into(),
            line,
            message: message.into(),
        }
    }

    /// Creates an UnknownItem error.
    pub fn unknown_item(key: impl Into<String>) -> Self {
        Self::UnknownItem { key: key.into() }
    }

    /// Creates a NotInOrder error.
    pub fn not_in_order(key: impl Into<String>) -> Self {
        Self::NotInOrder { key: key.into() }
    }

    /// Creates a PersistenceHandoff error.
    pub fn persistence_handoff(message: impl Into<String>) -> Self {
        Self::PersistenceHandoff(message.into())
    }

    /// Creates an IO error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is a CatalogLoad error.
    pub fn is_catalog_load(&self) -> bool {
        matches!(self, Self::CatalogLoad { .. })
    }

    /// Check if this is a NotInOrder error.
    pub fn is_not_in_order(&self) -> bool {
        matches!(self, Self::NotInOrder { .. })
    }

    /// True for errors a conversation recovers from with a re-prompt.
    ///
    /// Catalog and configuration problems are fatal at startup; everything
    /// else is surfaced to the customer as a clarification or to the
    /// operator as a retryable hand-off failure.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::CatalogLoad { .. } | Self::Config(_) | Self::Io { .. }
        )
    }
}

impl From<std::io::Error> for ComandaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

/// A type alias for `Result<T, ComandaError>`.
pub type Result<T> = std::result::Result<T, ComandaError>;
