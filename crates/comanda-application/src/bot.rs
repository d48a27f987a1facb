//! The order bot: session registry plus message dispatch.
//!
//! Messages for the same customer are handled strictly sequentially behind
//! the session's own lock; messages from different customers proceed in
//! parallel with no shared mutable state beyond the read-only catalog.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};

use comanda_core::catalog::{AliasIndex, Catalog};
use comanda_core::config::BotConfig;
use comanda_core::conversation::{CustomerSession, StateMachine, prompts};
use comanda_core::intent::{FallbackClassifier, IntentClassifier};
use comanda_core::order::OrderSink;
use comanda_core::Result;

use crate::message::{InboundMessage, OutboundMessage};

type SessionHandle = Arc<Mutex<CustomerSession>>;

/// Owns every conversation session and drives the core pipeline:
/// classify -> state machine -> order mutation -> replies -> hand-off.
pub struct OrderBot {
    config: Arc<BotConfig>,
    classifier: IntentClassifier,
    machine: StateMachine,
    sink: Arc<dyn OrderSink>,
    sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
}

impl OrderBot {
    pub fn new(
        catalog: Arc<Catalog>,
        aliases: Arc<AliasIndex>,
        config: Arc<BotConfig>,
        fallback: Arc<dyn FallbackClassifier>,
        sink: Arc<dyn OrderSink>,
    ) -> Self {
        let classifier = IntentClassifier::new(
            catalog.clone(),
            aliases,
            fallback,
            config.fallback.confidence_threshold,
        );
        let machine = StateMachine::new(catalog, config.clone());
        Self {
            config,
            classifier,
            machine,
            sink,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Handles one inbound message and returns the replies to send back.
    ///
    /// A hand-off failure never reaches the customer: the order stays
    /// confirmed, the snapshot is parked for [`OrderBot::retry_handoff`] and
    /// the operator sees the error in the log.
    pub async fn handle_message(&self, message: InboundMessage) -> Result<Vec<OutboundMessage>> {
        let handle = self.session_handle(&message.customer_id, message.timestamp).await;
        let mut session = handle.lock().await;

        // A finished session is archived in place: the next contact starts
        // a fresh order at Idle.
        if session.is_archivable(message.timestamp, self.idle_timeout()) {
            tracing::info!(
                customer_id = %message.customer_id,
                state = %session.state,
                "archiving finished session, starting a fresh one"
            );
            *session = CustomerSession::new(message.customer_id.clone(), message.timestamp);
        }

        let intent = self.classifier.classify(&message.text, session.state).await;
        tracing::debug!(
            customer_id = %message.customer_id,
            state = %session.state,
            ?intent,
            "classified inbound message"
        );

        let mut turn = self.machine.handle(&mut session, intent, message.timestamp);

        if let Some(snapshot) = turn.handoff.take() {
            match self.sink.deliver(&snapshot).await {
                Ok(number) => {
                    session.ticket_number = Some(number);
                    session.handed_off = true;
                    session.pending_handoff = None;
                    turn.replies.push(prompts::ticket_assigned(number));
                }
                Err(err) => {
                    // The order stays CONFIRMED; re-sending is only ever
                    // triggered explicitly, keeping the hand-off at-most-once.
                    tracing::error!(
                        customer_id = %message.customer_id,
                        %err,
                        "confirmed order hand-off failed; waiting for an explicit retry"
                    );
                    session.handed_off = false;
                    session.pending_handoff = Some(snapshot);
                }
            }
        }

        session.last_activity = message.timestamp;
        Ok(turn
            .replies
            .into_iter()
            .map(|text| OutboundMessage {
                customer_id: message.customer_id.clone(),
                text,
            })
            .collect())
    }

    /// Explicit retry trigger for a parked hand-off. Returns the ticket
    /// number on success, `None` when there is nothing to retry, and the
    /// sink's error when the retry fails again.
    pub async fn retry_handoff(&self, customer_id: &str) -> Result<Option<u64>> {
        let handle = {
            let sessions = self.sessions.read().await;
            sessions.get(customer_id).cloned()
        };
        let Some(handle) = handle else {
            return Ok(None);
        };
        let mut session = handle.lock().await;
        let Some(snapshot) = session.pending_handoff.clone() else {
            return Ok(None);
        };

        let number = self.sink.deliver(&snapshot).await?;
        session.ticket_number = Some(number);
        session.handed_off = true;
        session.pending_handoff = None;
        tracing::info!(customer_id, ticket = number, "parked hand-off delivered");
        Ok(Some(number))
    }

    /// Customer ids whose confirmed orders still await a hand-off retry.
    pub async fn pending_handoffs(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        let mut pending = Vec::new();
        for (customer_id, handle) in sessions.iter() {
            if let Ok(session) = handle.try_lock() {
                if session.pending_handoff.is_some() {
                    pending.push(customer_id.clone());
                }
            }
        }
        pending
    }

    /// Drops every archivable session from the registry. Intended for a
    /// periodic sweep; sessions are also recycled lazily on next contact.
    pub async fn archive_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !session.is_archivable(now, self.idle_timeout()),
            // A locked session is mid-message and therefore not idle.
            Err(_) => true,
        });
        let archived = before - sessions.len();
        if archived > 0 {
            tracing::info!(archived, "archived idle sessions");
        }
        archived
    }

    /// Number of live sessions, for diagnostics.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn idle_timeout(&self) -> Duration {
        Duration::minutes(self.config.idle_timeout_minutes)
    }

    async fn session_handle(&self, customer_id: &str, now: DateTime<Utc>) -> SessionHandle {
        {
            let sessions = self.sessions.read().await;
            if let Some(handle) = sessions.get(customer_id) {
                return handle.clone();
            }
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(customer_id.to_string())
            .or_insert_with(|| {
                tracing::info!(customer_id, "new conversation session");
                Arc::new(Mutex::new(CustomerSession::new(customer_id, now)))
            })
            .clone()
    }
}
