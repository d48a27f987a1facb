//! Runtime configuration types.
//!
//! Values are deserialized from `comanda.toml` by the infrastructure crate
//! and may be overridden per-deployment through environment variables.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration for the ordering bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Business name shown in the greeting.
    pub business_name: String,
    /// Surcharge added to the grand total for delivery orders.
    pub delivery_fee: Decimal,
    /// Preparation estimate quoted to the customer, in minutes.
    pub eta_minutes: u32,
    /// Inactivity window after which a confirmed session is archived.
    pub idle_timeout_minutes: i64,
    /// Completion-service fallback settings.
    pub fallback: FallbackConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            business_name: "Comanda".to_string(),
            delivery_fee: Decimal::ZERO,
            eta_minutes: 20,
            idle_timeout_minutes: 20,
            fallback: FallbackConfig::default(),
        }
    }
}

/// Settings for the external intent-classification fallback.
///
/// The endpoint is an OpenAI-compatible chat-completions server; disabled by
/// default so the core rules run without any network dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    /// Hard deadline for one fallback call. The call is attempted once and
    /// never retried inline.
    pub timeout_secs: u64,
    /// Guesses below this confidence are discarded.
    pub confidence_threshold: f32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://127.0.0.1:8080/v1".to_string(),
            model: "local-model".to_string(),
            api_key: "none".to_string(),
            timeout_secs: 10,
            confidence_threshold: 0.6,
        }
    }
}
