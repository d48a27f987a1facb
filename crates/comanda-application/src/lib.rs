//! Orchestration layer: per-customer sessions, sequential message handling
//! and the at-most-once hand-off of confirmed orders.

pub mod bot;
pub mod message;

pub use bot::OrderBot;
pub use message::{InboundMessage, OutboundMessage};
