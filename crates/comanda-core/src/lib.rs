//! Core domain of the comanda ordering bot.
//!
//! Everything here is deterministic and free of I/O, with one deliberate
//! exception: the intent classifier may consult an injected
//! [`intent::FallbackClassifier`], which is advisory and timeout-bounded on
//! the implementation side.

pub mod catalog;
pub mod config;
pub mod conversation;
pub mod error;
pub mod intent;
pub mod order;
pub mod text;

// Re-export common error types
pub use error::{ComandaError, MissingField, Result};
