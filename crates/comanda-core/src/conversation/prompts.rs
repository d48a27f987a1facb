//! Customer-facing prompt texts.
//!
//! Every outbound string lives here so the machine stays readable and the
//! wording can be tuned in one place. Failures are always phrased as a
//! clarification or re-prompt, never as an internal error.

use rust_decimal::Decimal;

use super::state::ConversationState;
use crate::catalog::Catalog;
use crate::config::BotConfig;
use crate::error::MissingField;
use crate::order::{DeliveryMode, Order};

/// Greeting plus the full menu, sent on first contact.
pub fn menu_text(catalog: &Catalog, config: &BotConfig) -> String {
    let mut lines = Vec::new();
    lines.push(format!("👋 ¡Hola! Soy el bot de {}.", config.business_name));
    lines.push("🧾 Menú:".to_string());
    for entry in catalog.entries() {
        lines.push(format!("🍽️ {} — ${}", entry.display_name, entry.price));
    }
    lines.push(String::new());
    if config.delivery_fee > Decimal::ZERO {
        lines.push(format!(
            "🚚 Envío ${} | ⏱️ {} min",
            config.delivery_fee, config.eta_minutes
        ));
    } else {
        lines.push(format!("⏱️ Demora aprox. {} min", config.eta_minutes));
    }
    lines.push("👉 Mandame tu pedido con cantidades (ej: “2 milanesas y 1 sanguche”)".to_string());
    lines.join("\n")
}

/// Running order summary with the derived total.
pub fn summary(
    order: &Order,
    catalog: &Catalog,
    config: &BotConfig,
    ticket: Option<u64>,
) -> String {
    let mut lines = Vec::new();
    match ticket {
        Some(number) => lines.push(format!("🧾 Pedido #{number}:")),
        None => lines.push("🧾 Tu pedido:".to_string()),
    }
    for line in order.lines() {
        let name = catalog
            .get(&line.item_key)
            .map(|entry| entry.display_name.clone())
            .unwrap_or_else(|| line.item_key.clone());
        lines.push(format!(
            "• {} x {} — ${}",
            line.quantity,
            name,
            line.line_total()
        ));
    }
    match order.delivery {
        Some(DeliveryMode::Delivery) => {
            lines.push(format!(
                "📍 Dirección: {}",
                order.address.as_deref().unwrap_or("-")
            ));
            lines.push(format!("🚚 Envío: ${}", config.delivery_fee));
        }
        Some(DeliveryMode::Pickup) => lines.push("🏃 Retiro en local".to_string()),
        None => {}
    }
    if let Some(payment) = order.payment {
        lines.push(format!("💳 Pago: {}", payment.label()));
    }
    for note in order.notes() {
        lines.push(format!("📝 {note}"));
    }
    lines.push(format!(
        "💰 Total: ${}",
        order.grand_total(config.delivery_fee)
    ));
    lines.push(format!("⏱️ Demora: {} min", config.eta_minutes));
    lines.join("\n")
}

pub fn delivery_prompt() -> String {
    "📦 ¿Envío o retiro?".to_string()
}

pub fn address_prompt() -> String {
    "📍 Perfecto. Decime la dirección por favor.".to_string()
}

pub fn payment_prompt() -> String {
    "💵 ¿Efectivo, tarjeta o transferencia?".to_string()
}

pub fn confirm_question() -> String {
    "¿Confirmás el pedido? (sí / cancelar)".to_string()
}

pub fn anything_else() -> &'static str {
    "¿Algo más? Escribí “listo” para continuar."
}

pub fn confirm_modified_question() -> &'static str {
    "¿Confirmás el pedido modificado? (sí / cancelar)"
}

pub fn cancelled_text() -> String {
    "❌ Pedido cancelado.".to_string()
}

/// Headline for a successful confirmation; the summary follows it.
pub fn confirmed_headline(modified: bool) -> &'static str {
    if modified {
        "✅ Pedido modificado confirmado. ¡Gracias!"
    } else {
        "✅ Pedido confirmado. ¡Gracias!"
    }
}

pub fn modify_hint() -> String {
    "¿Querés agregar o cambiar algo? Escribí “modificar”. Si no, ¡ya está en preparación! 👨‍🍳"
        .to_string()
}

pub fn already_confirmed() -> String {
    "✅ Tu pedido ya está confirmado y en preparación.".to_string()
}

pub fn note_ack(text: &str) -> String {
    format!("📝 Anotado para la cocina: “{text}”. Escribí “listo” para reconfirmar.")
}

/// Sent once the sink assigns (or reuses) the ticket number.
pub fn ticket_assigned(number: u64) -> String {
    format!("🧾 Tu pedido es el #{number}.")
}

pub fn unknown_item(token: &str) -> String {
    format!("🤔 No encontré “{token}” en el menú.")
}

pub fn not_in_order(name: &str) -> String {
    format!("🤔 {name} no estaba en tu pedido.")
}

/// Clarification listing the valid next actions for the current state.
/// Sent whenever a message cannot be classified; the message is never
/// silently dropped.
pub fn clarification(state: ConversationState) -> String {
    match state {
        ConversationState::Idle | ConversationState::Greeted => {
            "No te entendí 🤔 Mandame tu pedido con cantidades (ej: “2 milanesas”), o escribí “menú” para ver la carta.".to_string()
        }
        ConversationState::BuildingOrder => {
            "No te entendí 🤔 Podés agregar productos (ej: “2 milanesas”), escribir “listo” para continuar, o “cancelar”.".to_string()
        }
        ConversationState::AwaitingDeliveryChoice => {
            "📦 ¿Envío o retiro? (o escribí “cancelar” para anular el pedido)".to_string()
        }
        ConversationState::AwaitingAddress => {
            "📍 Necesito la dirección de entrega. Escribila en un mensaje, o “cancelar” para anular.".to_string()
        }
        ConversationState::AwaitingPayment => {
            "💵 ¿Efectivo, tarjeta o transferencia? (o “cancelar” para anular)".to_string()
        }
        ConversationState::AwaitingConfirmation => {
            "¿Confirmás el pedido? Escribí “sí” para confirmar, agregá productos, o “cancelar” para anularlo.".to_string()
        }
        ConversationState::Confirmed => {
            "Tu pedido está en preparación 👨‍🍳 Podés escribir “modificar” para cambiarlo o “cancelar” para anularlo.".to_string()
        }
        ConversationState::Modifying => {
            "Decime qué agregás o sacás (ej: “2 cocas”, “sacá las papas”), una nota para la cocina (“sin cebolla”), o “listo” para reconfirmar.".to_string()
        }
        ConversationState::Cancelled => {
            "No hay un pedido activo. Mandame un mensaje cuando quieras arrancar uno nuevo.".to_string()
        }
    }
}

/// Corrective prompt naming the field that still blocks confirmation.
pub fn incomplete_prompt(missing: MissingField) -> String {
    let follow_up = match missing {
        MissingField::Items => "Agregá al menos un producto (ej: “2 milanesas”).",
        MissingField::DeliveryMode => "📦 ¿Envío o retiro?",
        MissingField::Address => "📍 Decime la dirección por favor.",
        MissingField::PaymentMethod => "💵 ¿Efectivo, tarjeta o transferencia?",
    };
    format!(
        "Todavía me falta {} para confirmar. {}",
        missing.prompt_name(),
        follow_up
    )
}

/// Asks the customer to pick between catalog entries an alias matched.
pub fn ambiguous_prompt(token: &str, candidates: &[String]) -> String {
    format!(
        "🤔 Con “{}” ¿te referís a {}? Decime cuál.",
        token,
        candidates.join(" o ")
    )
}
