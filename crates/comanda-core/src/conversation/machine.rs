//! The conversation state machine.
//!
//! Receives the classified intent for one inbound message, mutates the
//! session's order through the `Order` operations, moves the state and
//! produces the outbound replies. The machine itself is synchronous and
//! side-effect free: the confirmed-order hand-off is returned to the caller
//! as part of the [`Turn`] rather than performed here.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::prompts;
use super::session::CustomerSession;
use super::state::ConversationState;
use crate::catalog::Catalog;
use crate::config::BotConfig;
use crate::error::ComandaError;
use crate::intent::{Intent, ItemQuantity};
use crate::order::{DeliveryMode, OrderSnapshot, PaymentMethod, SnapshotLine};

/// The outcome of one handled message.
#[derive(Debug, Default)]
pub struct Turn {
    /// Replies to send back to the customer, in order.
    pub replies: Vec<String>,
    /// Present exactly when this message confirmed the order; the caller
    /// performs the at-most-once hand-off.
    pub handoff: Option<OrderSnapshot>,
}

/// Drives one session through the ordering journey.
pub struct StateMachine {
    catalog: Arc<Catalog>,
    config: Arc<BotConfig>,
}

impl StateMachine {
    pub fn new(catalog: Arc<Catalog>, config: Arc<BotConfig>) -> Self {
        Self { catalog, config }
    }

    /// Applies one classified intent to the session.
    pub fn handle(
        &self,
        session: &mut CustomerSession,
        intent: Intent,
        now: DateTime<Utc>,
    ) -> Turn {
        let mut turn = Turn::default();
        match intent {
            Intent::Cancel => self.on_cancel(session, &mut turn),
            Intent::AmbiguousItem { token, candidates } => {
                turn.replies
                    .push(prompts::ambiguous_prompt(&token, &candidates));
            }
            other => self.dispatch(session, other, now, &mut turn),
        }
        if turn.replies.is_empty() {
            // Every message gets an answer, whatever happened above.
            turn.replies.push(prompts::clarification(session.state));
        }
        turn
    }

    /// Cancel always wins: reachable from every non-terminal state.
    fn on_cancel(&self, session: &mut CustomerSession, turn: &mut Turn) {
        if session.state.is_terminal() {
            turn.replies
                .push(prompts::clarification(ConversationState::Cancelled));
            return;
        }
        if let Err(err) = session.order.cancel() {
            tracing::warn!(%err, customer_id = %session.customer_id, "cancel on closed order");
        }
        session.state = ConversationState::Cancelled;
        turn.replies.push(prompts::cancelled_text());
    }

    fn dispatch(
        &self,
        session: &mut CustomerSession,
        intent: Intent,
        now: DateTime<Utc>,
        turn: &mut Turn,
    ) {
        use ConversationState as S;
        match session.state {
            S::Idle => match intent {
                // Items in the very first message are never dropped behind
                // a forced menu round-trip.
                Intent::AddItems(items) => {
                    self.apply_add(session, &items, &mut turn.replies);
                    session.state = S::BuildingOrder;
                    turn.replies.push(self.building_summary(session));
                }
                _ => {
                    session.state = S::Greeted;
                    turn.replies
                        .push(prompts::menu_text(&self.catalog, &self.config));
                }
            },
            S::Greeted => match intent {
                Intent::AddItems(items) => {
                    self.apply_add(session, &items, &mut turn.replies);
                    session.state = S::BuildingOrder;
                    turn.replies.push(self.building_summary(session));
                }
                Intent::Greet => turn
                    .replies
                    .push(prompts::menu_text(&self.catalog, &self.config)),
                _ => turn.replies.push(prompts::clarification(session.state)),
            },
            S::BuildingOrder => match intent {
                Intent::AddItems(items) => {
                    self.apply_add(session, &items, &mut turn.replies);
                    turn.replies.push(self.building_summary(session));
                }
                Intent::RemoveItems(items) => {
                    self.apply_remove(session, &items, &mut turn.replies);
                    turn.replies.push(self.building_summary(session));
                }
                Intent::Confirm => {
                    if session.order.is_empty() {
                        turn.replies.push(prompts::clarification(session.state));
                    } else {
                        session.state = S::AwaitingDeliveryChoice;
                        turn.replies.push(prompts::delivery_prompt());
                    }
                }
                Intent::Greet => turn
                    .replies
                    .push(prompts::menu_text(&self.catalog, &self.config)),
                _ => turn.replies.push(prompts::clarification(session.state)),
            },
            S::AwaitingDeliveryChoice => match intent {
                Intent::ChooseDelivery(mode) => {
                    if session.order.set_delivery(mode).is_err() {
                        turn.replies.push(prompts::clarification(session.state));
                        return;
                    }
                    if mode == DeliveryMode::Delivery {
                        session.state = S::AwaitingAddress;
                        turn.replies.push(prompts::address_prompt());
                    } else {
                        session.state = S::AwaitingPayment;
                        turn.replies.push(prompts::payment_prompt());
                    }
                }
                Intent::AddItems(items) => {
                    // Late additions are welcome; the pending question is
                    // simply asked again.
                    self.apply_add(session, &items, &mut turn.replies);
                    turn.replies.push(self.building_summary(session));
                    turn.replies.push(prompts::delivery_prompt());
                }
                _ => turn.replies.push(prompts::clarification(session.state)),
            },
            S::AwaitingAddress => match intent {
                Intent::ProvideAddress(text) => match session.order.set_address(&text) {
                    Ok(()) => {
                        session.state = S::AwaitingPayment;
                        turn.replies.push(prompts::payment_prompt());
                    }
                    Err(_) => turn.replies.push(prompts::address_prompt()),
                },
                _ => turn.replies.push(prompts::clarification(session.state)),
            },
            S::AwaitingPayment => match intent {
                Intent::ChoosePayment(method) => {
                    if session.order.set_payment(method).is_err() {
                        turn.replies.push(prompts::clarification(session.state));
                        return;
                    }
                    session.state = S::AwaitingConfirmation;
                    turn.replies.push(prompts::summary(
                        &session.order,
                        &self.catalog,
                        &self.config,
                        session.ticket_number,
                    ));
                    turn.replies.push(prompts::confirm_question());
                }
                Intent::AddItems(items) => {
                    self.apply_add(session, &items, &mut turn.replies);
                    turn.replies.push(self.building_summary(session));
                    turn.replies.push(prompts::payment_prompt());
                }
                _ => turn.replies.push(prompts::clarification(session.state)),
            },
            S::AwaitingConfirmation => match intent {
                Intent::Confirm => self.try_confirm(session, now, turn),
                Intent::AddItems(items) => {
                    self.apply_add(session, &items, &mut turn.replies);
                    turn.replies.push(prompts::summary(
                        &session.order,
                        &self.catalog,
                        &self.config,
                        session.ticket_number,
                    ));
                    turn.replies.push(prompts::confirm_question());
                }
                Intent::RemoveItems(items) => {
                    self.apply_remove(session, &items, &mut turn.replies);
                    turn.replies.push(prompts::summary(
                        &session.order,
                        &self.catalog,
                        &self.config,
                        session.ticket_number,
                    ));
                    turn.replies.push(prompts::confirm_question());
                }
                _ => turn.replies.push(prompts::clarification(session.state)),
            },
            S::Confirmed => match intent {
                Intent::Modify => {
                    if session.order.reopen_for_modification().is_err() {
                        turn.replies.push(prompts::clarification(session.state));
                        return;
                    }
                    session.state = S::Modifying;
                    turn.replies.push(prompts::clarification(S::Modifying));
                }
                Intent::AddItems(items) => {
                    if session.order.reopen_for_modification().is_err() {
                        turn.replies.push(prompts::clarification(session.state));
                        return;
                    }
                    session.state = S::Modifying;
                    self.apply_add(session, &items, &mut turn.replies);
                    turn.replies.push(self.modified_summary(session));
                }
                Intent::RemoveItems(items) => {
                    if session.order.reopen_for_modification().is_err() {
                        turn.replies.push(prompts::clarification(session.state));
                        return;
                    }
                    session.state = S::Modifying;
                    self.apply_remove(session, &items, &mut turn.replies);
                    turn.replies.push(self.modified_summary(session));
                }
                Intent::Confirm => turn.replies.push(prompts::already_confirmed()),
                _ => turn.replies.push(prompts::clarification(session.state)),
            },
            S::Modifying => match intent {
                Intent::AddItems(items) => {
                    self.apply_add(session, &items, &mut turn.replies);
                    turn.replies.push(self.modified_summary(session));
                }
                Intent::RemoveItems(items) => {
                    self.apply_remove(session, &items, &mut turn.replies);
                    turn.replies.push(self.modified_summary(session));
                }
                Intent::Note(text) => {
                    if session.order.add_note(&text).is_err() {
                        turn.replies.push(prompts::clarification(session.state));
                        return;
                    }
                    turn.replies.push(prompts::note_ack(&text));
                }
                Intent::Confirm => self.try_confirm(session, now, turn),
                _ => turn.replies.push(prompts::clarification(session.state)),
            },
            S::Cancelled => turn
                .replies
                .push(prompts::clarification(ConversationState::Cancelled)),
        }
    }

    /// Runs `Order::confirm` and either moves to Confirmed with a hand-off
    /// snapshot, or stays at the confirmation question with a corrective
    /// prompt naming the missing field.
    fn try_confirm(&self, session: &mut CustomerSession, now: DateTime<Utc>, turn: &mut Turn) {
        match session.order.confirm() {
            Ok(()) => {
                session.state = ConversationState::Confirmed;
                let snapshot = self.snapshot(session, now);
                turn.replies.push(format!(
                    "{}\n{}",
                    prompts::confirmed_headline(snapshot.modified),
                    prompts::summary(
                        &session.order,
                        &self.catalog,
                        &self.config,
                        session.ticket_number,
                    )
                ));
                turn.replies.push(prompts::modify_hint());
                turn.handoff = Some(snapshot);
            }
            Err(ComandaError::IncompleteOrder { missing }) => {
                session.state = ConversationState::AwaitingConfirmation;
                turn.replies.push(prompts::incomplete_prompt(missing));
            }
            Err(err) => {
                tracing::warn!(%err, customer_id = %session.customer_id, "confirm rejected");
                turn.replies.push(prompts::clarification(session.state));
            }
        }
    }

    fn apply_add(
        &self,
        session: &mut CustomerSession,
        items: &[ItemQuantity],
        replies: &mut Vec<String>,
    ) {
        for item in items {
            if let Err(err) = session
                .order
                .add_item(&self.catalog, &item.key, item.quantity)
            {
                tracing::warn!(%err, key = %item.key, "item could not be added");
                replies.push(prompts::unknown_item(&item.key));
            }
        }
    }

    fn apply_remove(
        &self,
        session: &mut CustomerSession,
        items: &[ItemQuantity],
        replies: &mut Vec<String>,
    ) {
        for item in items {
            match session.order.remove_item(&item.key, item.quantity) {
                Ok(()) => {}
                Err(err) if err.is_not_in_order() => {
                    let name = self
                        .catalog
                        .get(&item.key)
                        .map(|entry| entry.display_name.clone())
                        .unwrap_or_else(|| item.key.clone());
                    replies.push(prompts::not_in_order(&name));
                }
                Err(err) => {
                    tracing::warn!(%err, key = %item.key, "item could not be removed");
                }
            }
        }
    }

    fn building_summary(&self, session: &CustomerSession) -> String {
        format!(
            "{}\n{}",
            prompts::summary(
                &session.order,
                &self.catalog,
                &self.config,
                session.ticket_number,
            ),
            prompts::anything_else()
        )
    }

    fn modified_summary(&self, session: &CustomerSession) -> String {
        format!(
            "{}\n{}",
            prompts::summary(
                &session.order,
                &self.catalog,
                &self.config,
                session.ticket_number,
            ),
            prompts::confirm_modified_question()
        )
    }

    fn snapshot(&self, session: &CustomerSession, now: DateTime<Utc>) -> OrderSnapshot {
        let order = &session.order;
        let lines = order
            .lines()
            .iter()
            .map(|line| SnapshotLine {
                display_name: self
                    .catalog
                    .get(&line.item_key)
                    .map(|entry| entry.display_name.clone())
                    .unwrap_or_else(|| line.item_key.clone()),
                quantity: line.quantity,
                unit_price: line.unit_price,
                line_total: line.line_total(),
            })
            .collect();
        // confirm() guarantees these are set; Pickup/Cash are inert defaults
        // for the impossible None case.
        let delivery = order.delivery.unwrap_or(DeliveryMode::Pickup);
        let delivery_fee =
            (delivery == DeliveryMode::Delivery).then(|| self.config.delivery_fee);
        OrderSnapshot {
            customer_id: session.customer_id.clone(),
            ticket_number: session.ticket_number,
            lines,
            items_total: order.total(),
            delivery_fee,
            grand_total: order.grand_total(self.config.delivery_fee),
            delivery,
            address: order.address.clone(),
            payment: order.payment.unwrap_or(PaymentMethod::Cash),
            notes: order.notes().to_vec(),
            modified: session.ticket_number.is_some(),
            confirmed_at: now,
        }
    }
}
