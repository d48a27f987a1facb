//! State-aware intent classification.
//!
//! Classification is an ordered rule list, not ad hoc string checks:
//!
//! 1. explicit cancel/confirm keywords always win, regardless of state,
//! 2. state-specific expected-input rules (delivery/payment/address/modify),
//! 3. item-mention detection via the alias index and quantity extractor,
//! 4. the external completion fallback, advisory only,
//! 5. otherwise Unknown.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::{AliasIndex, Catalog, ItemMention, QuantityMention, quantity};
use crate::conversation::ConversationState;
use crate::intent::fallback::{FallbackClassifier, FallbackContext, GuessKind};
use crate::intent::model::{Intent, ItemQuantity};
use crate::order::{DeliveryMode, PaymentMethod};
use crate::text;

static CANCEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(cancel\w*|anul\w*)\b").unwrap());
static CONFIRM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(si|s|dale|ok|oka|okay|listo|confirmo|confirmado|de una|deuna|eso es todo|nada mas|ya esta)$")
        .unwrap()
});
static DELIVERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(envio|enviar|envia|domicilio|delivery|mandar|mandalo)\b").unwrap());
static PICKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(retiro|retirar|retira|paso|busco|buscar|voy)\b").unwrap());
static PAY_CASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(efectivo|cash)\b").unwrap());
static PAY_CARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(tarjeta|debito|credito|card)\b").unwrap());
static PAY_TRANSFER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(transferencia|transfiero|transferir|transf|cbu|alias)\b").unwrap());
static GREET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(hola|buenas|buen dia|buenos dias|que tal|como estas)\b").unwrap()
});
static MENU: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(menu|carta|precio|precios|que hay|que tenes|que venden)\b").unwrap()
});
static MODIFY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(modificar|modifica|modifico|cambiar|cambia|cambio|agregar|agrega|sumar|suma)\b")
        .unwrap()
});
static REMOVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(saca|sacar|sacale|sacame|quita|quitar|quitale|elimina|eliminar|borra|borrar|menos)\b")
        .unwrap()
});
static NOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(sin|con|nota)\b").unwrap());

/// Classifies inbound messages against the current conversation state.
pub struct IntentClassifier {
    catalog: Arc<Catalog>,
    aliases: Arc<AliasIndex>,
    fallback: Arc<dyn FallbackClassifier>,
    confidence_threshold: f32,
}

impl IntentClassifier {
    pub fn new(
        catalog: Arc<Catalog>,
        aliases: Arc<AliasIndex>,
        fallback: Arc<dyn FallbackClassifier>,
        confidence_threshold: f32,
    ) -> Self {
        Self {
            catalog,
            aliases,
            fallback,
            confidence_threshold,
        }
    }

    /// Maps a message to an intent given the current state.
    ///
    /// The only I/O on this path is the bounded completion fallback, and a
    /// failing fallback degrades to `Intent::Unknown`.
    pub async fn classify(&self, raw: &str, state: ConversationState) -> Intent {
        let normalized = text::normalize(raw);
        if normalized.is_empty() {
            return Intent::Unknown;
        }

        if CANCEL.is_match(&normalized) {
            return Intent::Cancel;
        }
        if CONFIRM.is_match(&normalized) {
            return Intent::Confirm;
        }

        if let Some(intent) = self.expected_input(&normalized, raw, state) {
            return intent;
        }
        if let Some(intent) = self.detect_items(&normalized) {
            return intent;
        }
        if state == ConversationState::Modifying && NOTE.is_match(&normalized) {
            return Intent::Note(text::clip_words(raw.trim(), 20));
        }
        if self.is_greeting(&normalized) {
            return Intent::Greet;
        }

        let context = FallbackContext {
            message: raw.to_string(),
            state,
        };
        if let Some(guess) = self.fallback.guess(&context).await {
            if guess.confidence >= self.confidence_threshold {
                if let Some(intent) = map_guess(guess.intent) {
                    tracing::debug!(
                        ?intent,
                        confidence = guess.confidence,
                        "using completion fallback guess"
                    );
                    return intent;
                }
            }
        }

        Intent::Unknown
    }

    /// Rules that only fire while the conversation waits for a specific
    /// input. "efectivo" is a payment choice while payment is expected and
    /// plain text everywhere else.
    fn expected_input(
        &self,
        normalized: &str,
        raw: &str,
        state: ConversationState,
    ) -> Option<Intent> {
        match state {
            ConversationState::AwaitingDeliveryChoice => {
                if DELIVERY.is_match(normalized) {
                    return Some(Intent::ChooseDelivery(DeliveryMode::Delivery));
                }
                if PICKUP.is_match(normalized) {
                    return Some(Intent::ChooseDelivery(DeliveryMode::Pickup));
                }
                None
            }
            ConversationState::AwaitingPayment => {
                detect_payment(normalized).map(Intent::ChoosePayment)
            }
            ConversationState::AwaitingAddress => {
                let address = text::clip_words(raw.trim(), 12);
                if address.is_empty() {
                    None
                } else {
                    Some(Intent::ProvideAddress(address))
                }
            }
            ConversationState::Confirmed => {
                // A bare "agregar"/"cambiar" opens the modification flow;
                // with an item mentioned, item detection takes over below.
                if MODIFY.is_match(normalized) && self.aliases.scan(normalized).is_empty() {
                    Some(Intent::Modify)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn detect_items(&self, normalized: &str) -> Option<Intent> {
        let mentions = self.aliases.scan(normalized);
        if mentions.is_empty() {
            return None;
        }
        for mention in &mentions {
            if mention.keys.len() > 1 {
                let token = normalized[mention.start..mention.end].to_string();
                let candidates = mention
                    .keys
                    .iter()
                    .filter_map(|key| self.catalog.get(key))
                    .map(|entry| entry.display_name.clone())
                    .collect();
                return Some(Intent::AmbiguousItem { token, candidates });
            }
        }
        let quantities = quantity::extract(normalized);
        let pairs = pair_quantities(&mentions, &quantities);
        if pairs.is_empty() {
            return None;
        }
        if REMOVE.is_match(normalized) {
            Some(Intent::RemoveItems(pairs))
        } else {
            Some(Intent::AddItems(pairs))
        }
    }

    fn is_greeting(&self, normalized: &str) -> bool {
        if MENU.is_match(normalized) {
            return true;
        }
        normalized.split(' ').count() <= 4 && GREET.is_match(normalized)
    }
}

fn detect_payment(normalized: &str) -> Option<PaymentMethod> {
    if PAY_CASH.is_match(normalized) {
        Some(PaymentMethod::Cash)
    } else if PAY_CARD.is_match(normalized) {
        Some(PaymentMethod::Card)
    } else if PAY_TRANSFER.is_match(normalized) {
        Some(PaymentMethod::Transfer)
    } else {
        None
    }
}

/// Pairs each item mention with its quantity.
///
/// Resolution is nearest-preceding-quantity within the same message, fenced
/// by the previous item mention so a quantity can never leak from one item
/// onto the next. The `x NN` suffix form binds backwards. Default is 1.
fn pair_quantities(mentions: &[ItemMention], quantities: &[QuantityMention]) -> Vec<ItemQuantity> {
    let mut out: Vec<ItemQuantity> = Vec::new();
    let mut floor = 0usize;
    for (idx, mention) in mentions.iter().enumerate() {
        let preceding = quantities
            .iter()
            .filter(|q| !q.suffix && q.end <= mention.start && q.start >= floor)
            .last()
            .map(|q| q.value);
        let value = preceding
            .or_else(|| {
                let next_start = mentions.get(idx + 1).map(|m| m.start).unwrap_or(usize::MAX);
                quantities
                    .iter()
                    .find(|q| {
                        q.suffix
                            && q.start >= mention.end
                            && q.start <= mention.end + 1
                            && q.end <= next_start
                    })
                    .map(|q| q.value)
            })
            .unwrap_or(1);
        floor = mention.end;
        if value == 0 {
            continue;
        }
        let Some(key) = mention.keys.first() else {
            continue;
        };
        if let Some(existing) = out.iter_mut().find(|iq| &iq.key == key) {
            existing.quantity += value;
        } else {
            out.push(ItemQuantity {
                key: key.clone(),
                quantity: value,
            });
        }
    }
    out
}

fn map_guess(kind: GuessKind) -> Option<Intent> {
    match kind {
        GuessKind::Greet => Some(Intent::Greet),
        GuessKind::Confirm => Some(Intent::Confirm),
        GuessKind::Cancel => Some(Intent::Cancel),
        GuessKind::Modify => Some(Intent::Modify),
        GuessKind::ChoosePickup => Some(Intent::ChooseDelivery(DeliveryMode::Pickup)),
        GuessKind::ChooseDelivery => Some(Intent::ChooseDelivery(DeliveryMode::Delivery)),
        GuessKind::PayCash => Some(Intent::ChoosePayment(PaymentMethod::Cash)),
        GuessKind::PayCard => Some(Intent::ChoosePayment(PaymentMethod::Card)),
        GuessKind::PayTransfer => Some(Intent::ChoosePayment(PaymentMethod::Transfer)),
        GuessKind::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use crate::intent::fallback::{FallbackGuess, NoopFallback};
    use async_trait::async_trait;

    fn classifier_with(fallback: Arc<dyn FallbackClassifier>) -> IntentClassifier {
        let catalog = Arc::new(
            Catalog::from_entries(vec![
                CatalogEntry::new("Burger", "5.00".parse().unwrap()),
                CatalogEntry::new("Fries", "2.00".parse().unwrap()),
            ])
            .unwrap(),
        );
        let aliases = Arc::new(
            AliasIndex::build(
                &catalog,
                &[
                    (
                        "burger".to_string(),
                        vec!["burguer".to_string(), "hamburguesa".to_string()],
                    ),
                    ("fries".to_string(), vec!["papas".to_string()]),
                ],
            )
            .unwrap(),
        );
        IntentClassifier::new(catalog, aliases, fallback, 0.6)
    }

    fn local_classifier() -> IntentClassifier {
        classifier_with(Arc::new(NoopFallback))
    }

    struct StubFallback(Option<FallbackGuess>);

    #[async_trait]
    impl FallbackClassifier for StubFallback {
        async fn guess(&self, _context: &FallbackContext) -> Option<FallbackGuess> {
            self.0
        }
    }

    #[tokio::test]
    async fn items_with_quantities_do_not_leak_across_mentions() {
        let classifier = local_classifier();
        let intent = classifier
            .classify("2 hamburguesas y papas", ConversationState::BuildingOrder)
            .await;
        assert_eq!(
            intent,
            Intent::AddItems(vec![
                ItemQuantity {
                    key: "burger".to_string(),
                    quantity: 2
                },
                ItemQuantity {
                    key: "fries".to_string(),
                    quantity: 1
                },
            ])
        );
    }

    #[tokio::test]
    async fn cancel_wins_in_every_state() {
        let classifier = local_classifier();
        for state in [
            ConversationState::Greeted,
            ConversationState::BuildingOrder,
            ConversationState::AwaitingAddress,
            ConversationState::AwaitingConfirmation,
        ] {
            assert_eq!(classifier.classify("cancelar", state).await, Intent::Cancel);
        }
    }

    #[tokio::test]
    async fn payment_words_are_state_aware() {
        let classifier = local_classifier();
        assert_eq!(
            classifier
                .classify("efectivo", ConversationState::AwaitingPayment)
                .await,
            Intent::ChoosePayment(PaymentMethod::Cash)
        );
        // Outside the payment question the same word is just noise.
        assert_eq!(
            classifier
                .classify("efectivo", ConversationState::BuildingOrder)
                .await,
            Intent::Unknown
        );
    }

    #[tokio::test]
    async fn delivery_choice_is_recognized() {
        let classifier = local_classifier();
        assert_eq!(
            classifier
                .classify("envío a domicilio", ConversationState::AwaitingDeliveryChoice)
                .await,
            Intent::ChooseDelivery(DeliveryMode::Delivery)
        );
        assert_eq!(
            classifier
                .classify("paso a buscarlo", ConversationState::AwaitingDeliveryChoice)
                .await,
            Intent::ChooseDelivery(DeliveryMode::Pickup)
        );
    }

    #[tokio::test]
    async fn address_state_captures_free_text() {
        let classifier = local_classifier();
        let intent = classifier
            .classify("Av. Siempreviva 742, timbre 3", ConversationState::AwaitingAddress)
            .await;
        assert_eq!(
            intent,
            Intent::ProvideAddress("Av. Siempreviva 742, timbre 3".to_string())
        );
    }

    #[tokio::test]
    async fn removal_verbs_turn_items_into_removals() {
        let classifier = local_classifier();
        let intent = classifier
            .classify("sacame las papas", ConversationState::Modifying)
            .await;
        assert_eq!(
            intent,
            Intent::RemoveItems(vec![ItemQuantity {
                key: "fries".to_string(),
                quantity: 1
            }])
        );
    }

    #[tokio::test]
    async fn note_markers_only_count_while_modifying() {
        let classifier = local_classifier();
        assert_eq!(
            classifier
                .classify("sin cebolla por favor", ConversationState::Modifying)
                .await,
            Intent::Note("sin cebolla por favor".to_string())
        );
        assert_eq!(
            classifier
                .classify("sin cebolla por favor", ConversationState::BuildingOrder)
                .await,
            Intent::Unknown
        );
    }

    #[tokio::test]
    async fn greetings_and_menu_requests() {
        let classifier = local_classifier();
        assert_eq!(
            classifier.classify("hola!", ConversationState::Idle).await,
            Intent::Greet
        );
        assert_eq!(
            classifier
                .classify("me pasás los precios?", ConversationState::Idle)
                .await,
            Intent::Greet
        );
    }

    #[tokio::test]
    async fn ambiguous_alias_is_surfaced_not_guessed() {
        let catalog = Arc::new(
            Catalog::from_entries(vec![
                CatalogEntry::new("Combo Clasico", "7.00".parse().unwrap()),
                CatalogEntry::new("Combo Doble", "9.00".parse().unwrap()),
            ])
            .unwrap(),
        );
        let aliases = Arc::new(
            AliasIndex::build(
                &catalog,
                &[
                    ("combo_clasico".to_string(), vec!["combo".to_string()]),
                    ("combo_doble".to_string(), vec!["combo".to_string()]),
                ],
            )
            .unwrap(),
        );
        let classifier = IntentClassifier::new(catalog, aliases, Arc::new(NoopFallback), 0.6);

        let intent = classifier
            .classify("un combo", ConversationState::BuildingOrder)
            .await;
        match intent {
            Intent::AmbiguousItem { token, candidates } => {
                assert_eq!(token, "combo");
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn confident_fallback_guess_is_used() {
        let classifier = classifier_with(Arc::new(StubFallback(Some(FallbackGuess {
            intent: GuessKind::Confirm,
            confidence: 0.9,
        }))));
        assert_eq!(
            classifier
                .classify("mandale nomas", ConversationState::AwaitingConfirmation)
                .await,
            Intent::Confirm
        );
    }

    #[tokio::test]
    async fn low_confidence_guess_is_discarded() {
        let classifier = classifier_with(Arc::new(StubFallback(Some(FallbackGuess {
            intent: GuessKind::Confirm,
            confidence: 0.3,
        }))));
        assert_eq!(
            classifier
                .classify("mandale nomas", ConversationState::AwaitingConfirmation)
                .await,
            Intent::Unknown
        );
    }

    #[tokio::test]
    async fn fallback_silence_degrades_to_unknown() {
        let classifier = local_classifier();
        assert_eq!(
            classifier
                .classify("qcyo ptm", ConversationState::AwaitingPayment)
                .await,
            Intent::Unknown
        );
    }
}
