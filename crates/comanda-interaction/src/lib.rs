//! External service clients for the comanda core.

pub mod completion_client;

pub use completion_client::CompletionFallback;
