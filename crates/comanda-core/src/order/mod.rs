//! The in-progress order: lines, totals, lifecycle and the confirmed-order
//! hand-off contract.

pub mod model;
pub mod sink;
pub mod snapshot;

pub use model::{DeliveryMode, Order, OrderLine, OrderStatus, PaymentMethod};
pub use sink::OrderSink;
pub use snapshot::{OrderSnapshot, SnapshotLine};
