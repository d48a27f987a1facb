//! Intent classification: inbound free text to a closed intent set.

pub mod classifier;
pub mod fallback;
pub mod model;

pub use classifier::IntentClassifier;
pub use fallback::{FallbackClassifier, FallbackContext, FallbackGuess, GuessKind, NoopFallback};
pub use model::{Intent, ItemQuantity};
