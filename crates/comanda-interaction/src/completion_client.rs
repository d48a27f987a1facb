//! CompletionFallback - intent guesses from an OpenAI-compatible endpoint.
//!
//! This is the one network dependency on the message path. It is strictly
//! advisory: a single bounded attempt per message, and every failure mode
//! (transport error, timeout, unparseable answer) is simply "no guess".

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use comanda_core::ComandaError;
use comanda_core::config::FallbackConfig;
use comanda_core::intent::{FallbackClassifier, FallbackContext, FallbackGuess};

/// Client for the chat-completions fallback service.
#[derive(Clone)]
pub struct CompletionFallback {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl CompletionFallback {
    pub fn new(config: &FallbackConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn system_prompt(context: &FallbackContext) -> String {
        format!(
            "Sos el clasificador de intenciones de un bot de pedidos de comida. \
             El estado actual de la conversación es {}. \
             Respondé SOLO con un JSON: {{\"intent\": \"...\", \"confidence\": 0.0-1.0}}. \
             Valores posibles de intent: greet, confirm, cancel, modify, choose_pickup, \
             choose_delivery, pay_cash, pay_card, pay_transfer, unknown. \
             Si el mensaje menciona productos o direcciones, respondé unknown: \
             esos casos los resuelve el bot localmente.",
            context.state
        )
    }

    async fn request(&self, context: &FallbackContext) -> Result<Option<FallbackGuess>, reqwest::Error> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Self::system_prompt(context),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: context.message.clone(),
                },
            ],
            temperature: 0.0,
            max_tokens: 60,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "completion fallback rejected the request");
            return Ok(None);
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();
        Ok(parse_guess(&content))
    }
}

#[async_trait]
impl FallbackClassifier for CompletionFallback {
    async fn guess(&self, context: &FallbackContext) -> Option<FallbackGuess> {
        match tokio::time::timeout(self.timeout, self.request(context)).await {
            Ok(Ok(guess)) => guess,
            Ok(Err(err)) => {
                tracing::warn!(%err, "completion fallback failed; degrading to unknown");
                None
            }
            Err(_) => {
                let err = ComandaError::ClassificationTimeout;
                tracing::warn!(%err, timeout_secs = self.timeout.as_secs(), "degrading to unknown");
                None
            }
        }
    }
}

/// Extracts the guess JSON from the model's answer, tolerating surrounding
/// prose or code fences.
fn parse_guess(content: &str) -> Option<FallbackGuess> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }
    let guess: FallbackGuess = serde_json::from_str(&content[start..=end]).ok()?;
    Some(guess)
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}
