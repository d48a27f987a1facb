//! Order domain model and intent-driven mutations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::{ComandaError, MissingField, Result};

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    Pickup,
    Delivery,
}

impl DeliveryMode {
    /// Customer-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            DeliveryMode::Pickup => "retiro en local",
            DeliveryMode::Delivery => "envío a domicilio",
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    /// Customer-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "efectivo",
            PaymentMethod::Card => "tarjeta",
            PaymentMethod::Transfer => "transferencia",
        }
    }
}

/// Order lifecycle. Transitions are Draft -> Confirmed, Draft -> Cancelled,
/// Confirmed -> Draft (reopened for modification) and
/// Confirmed -> Cancelled. Cancelled is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum OrderStatus {
    Draft,
    Confirmed,
    Cancelled,
}

/// One line of the order. The unit price is snapshotted when the item is
/// first added so a catalog reload mid-conversation cannot change a running
/// total behind the customer's back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub item_key: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The in-progress order owned by one conversation session.
///
/// The total is always derived from the lines, never stored, so it cannot
/// go stale while the conversation mutates the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    lines: Vec<OrderLine>,
    pub delivery: Option<DeliveryMode>,
    pub address: Option<String>,
    pub payment: Option<PaymentMethod>,
    status: OrderStatus,
    notes: Vec<String>,
}

impl Default for Order {
    fn default() -> Self {
        Self::new()
    }
}

impl Order {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            delivery: None,
            address: None,
            payment: None,
            status: OrderStatus::Draft,
            notes: Vec::new(),
        }
    }

    /// Lines in insertion order, which is also display order.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Free-text kitchen notes attached during modification.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The items total, derived on every call.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(OrderLine::line_total).sum()
    }

    /// Items total plus the delivery surcharge when this is a delivery
    /// order. The surcharge lives outside the lines so the line invariant
    /// stays untouched.
    pub fn grand_total(&self, delivery_fee: Decimal) -> Decimal {
        match self.delivery {
            Some(DeliveryMode::Delivery) => self.total() + delivery_fee,
            _ => self.total(),
        }
    }

    fn ensure_draft(&self) -> Result<()> {
        if self.status == OrderStatus::Draft {
            Ok(())
        } else {
            Err(ComandaError::OrderClosed {
                status: self.status,
            })
        }
    }

    /// Adds `quantity` of the item behind `key`, accumulating onto an
    /// existing line for the same key.
    ///
    /// The key is validated against the catalog even though callers are
    /// expected to pass resolver output.
    pub fn add_item(&mut self, catalog: &Catalog, key: &str, quantity: u32) -> Result<()> {
        self.ensure_draft()?;
        if quantity == 0 {
            return Ok(());
        }
        let entry = catalog
            .get(key)
            .ok_or_else(|| ComandaError::unknown_item(key))?;
        if let Some(line) = self.lines.iter_mut().find(|l| l.item_key == key) {
            line.quantity += quantity;
        } else {
            self.lines.push(OrderLine {
                item_key: entry.key.clone(),
                quantity,
                unit_price: entry.price,
            });
        }
        Ok(())
    }

    /// Removes `quantity` of an item. Removing more than present clamps to
    /// zero and drops the line; a key that is not on the order reports
    /// `NotInOrder` so the caller can re-prompt instead of crashing.
    pub fn remove_item(&mut self, key: &str, quantity: u32) -> Result<()> {
        self.ensure_draft()?;
        let Some(idx) = self.lines.iter().position(|l| l.item_key == key) else {
            return Err(ComandaError::not_in_order(key));
        };
        if quantity >= self.lines[idx].quantity {
            self.lines.remove(idx);
        } else {
            self.lines[idx].quantity -= quantity;
        }
        Ok(())
    }

    pub fn set_delivery(&mut self, mode: DeliveryMode) -> Result<()> {
        self.ensure_draft()?;
        self.delivery = Some(mode);
        Ok(())
    }

    pub fn set_payment(&mut self, method: PaymentMethod) -> Result<()> {
        self.ensure_draft()?;
        self.payment = Some(method);
        Ok(())
    }

    pub fn set_address(&mut self, text: &str) -> Result<()> {
        self.ensure_draft()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ComandaError::config("address must not be empty"));
        }
        self.address = Some(trimmed.to_string());
        Ok(())
    }

    /// Records a free-text kitchen note, printed on the ticket.
    pub fn add_note(&mut self, text: &str) -> Result<()> {
        self.ensure_draft()?;
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            self.notes.push(trimmed.to_string());
        }
        Ok(())
    }

    /// The first field still blocking confirmation, if any.
    pub fn missing_field(&self) -> Option<MissingField> {
        if self.lines.is_empty() {
            return Some(MissingField::Items);
        }
        match self.delivery {
            None => return Some(MissingField::DeliveryMode),
            Some(DeliveryMode::Delivery) => {
                if self.address.as_deref().map_or(true, |a| a.trim().is_empty()) {
                    return Some(MissingField::Address);
                }
            }
            Some(DeliveryMode::Pickup) => {}
        }
        if self.payment.is_none() {
            return Some(MissingField::PaymentMethod);
        }
        None
    }

    /// Confirms the order, making it eligible for the downstream hand-off.
    pub fn confirm(&mut self) -> Result<()> {
        self.ensure_draft()?;
        if let Some(missing) = self.missing_field() {
            return Err(ComandaError::IncompleteOrder { missing });
        }
        self.status = OrderStatus::Confirmed;
        Ok(())
    }

    /// Reopens a confirmed order for the modification sub-flow. The single
    /// legal entry point back into Draft.
    pub fn reopen_for_modification(&mut self) -> Result<()> {
        if self.status != OrderStatus::Confirmed {
            return Err(ComandaError::OrderClosed {
                status: self.status,
            });
        }
        self.status = OrderStatus::Draft;
        Ok(())
    }

    /// Cancels the order. Legal from Draft or Confirmed; terminal.
    pub fn cancel(&mut self) -> Result<()> {
        if self.status == OrderStatus::Cancelled {
            return Err(ComandaError::OrderClosed {
                status: self.status,
            });
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn catalog() -> Catalog {
        Catalog::from_entries(vec![
            CatalogEntry::new("Burger", "5.00".parse().unwrap()),
            CatalogEntry::new("Fries", "2.00".parse().unwrap()),
        ])
        .unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn total_is_always_derived_from_lines() {
        let catalog = catalog();
        let mut order = Order::new();
        order.add_item(&catalog, "burger", 2).unwrap();
        order.add_item(&catalog, "fries", 1).unwrap();
        assert_eq!(order.total(), dec("12.00"));

        order.add_item(&catalog, "burger", 1).unwrap();
        assert_eq!(order.lines().len(), 2);
        assert_eq!(order.total(), dec("17.00"));
    }

    #[test]
    fn adding_accumulates_on_the_existing_line() {
        let catalog = catalog();
        let mut order = Order::new();
        order.add_item(&catalog, "burger", 1).unwrap();
        order.add_item(&catalog, "burger", 2).unwrap();
        assert_eq!(order.lines().len(), 1);
        assert_eq!(order.lines()[0].quantity, 3);
    }

    #[test]
    fn unknown_item_is_rejected() {
        let catalog = catalog();
        let mut order = Order::new();
        let err = order.add_item(&catalog, "pizza", 1).unwrap_err();
        assert_eq!(err, ComandaError::unknown_item("pizza"));
    }

    #[test]
    fn removal_clamps_to_zero_and_drops_the_line() {
        let catalog = catalog();
        let mut order = Order::new();
        order.add_item(&catalog, "burger", 2).unwrap();
        order.remove_item("burger", 5).unwrap();
        assert!(order.is_empty());
        assert_eq!(order.total(), Decimal::ZERO);
    }

    #[test]
    fn removing_an_absent_item_reports_not_in_order() {
        let mut order = Order::new();
        let err = order.remove_item("burger", 1).unwrap_err();
        assert!(err.is_not_in_order());
    }

    #[test]
    fn confirm_requires_every_field() {
        let catalog = catalog();
        let mut order = Order::new();
        assert_eq!(
            order.confirm().unwrap_err(),
            ComandaError::IncompleteOrder {
                missing: MissingField::Items
            }
        );

        order.add_item(&catalog, "burger", 1).unwrap();
        assert_eq!(
            order.confirm().unwrap_err(),
            ComandaError::IncompleteOrder {
                missing: MissingField::DeliveryMode
            }
        );

        order.set_delivery(DeliveryMode::Delivery).unwrap();
        assert_eq!(
            order.confirm().unwrap_err(),
            ComandaError::IncompleteOrder {
                missing: MissingField::Address
            }
        );

        order.set_address("Av. Siempreviva 742").unwrap();
        assert_eq!(
            order.confirm().unwrap_err(),
            ComandaError::IncompleteOrder {
                missing: MissingField::PaymentMethod
            }
        );

        order.set_payment(PaymentMethod::Cash).unwrap();
        order.confirm().unwrap();
        assert_eq!(order.status(), OrderStatus::Confirmed);
    }

    #[test]
    fn confirm_never_succeeds_for_delivery_without_address() {
        let catalog = catalog();
        let mut order = Order::new();
        order.add_item(&catalog, "burger", 1).unwrap();
        order.set_delivery(DeliveryMode::Delivery).unwrap();
        order.set_payment(PaymentMethod::Cash).unwrap();
        assert_eq!(
            order.confirm().unwrap_err(),
            ComandaError::IncompleteOrder {
                missing: MissingField::Address
            }
        );
    }

    #[test]
    fn cancelled_orders_reject_all_mutation() {
        let catalog = catalog();
        let mut order = Order::new();
        order.add_item(&catalog, "burger", 1).unwrap();
        order.cancel().unwrap();

        assert!(matches!(
            order.add_item(&catalog, "fries", 1),
            Err(ComandaError::OrderClosed { .. })
        ));
        assert!(matches!(
            order.cancel(),
            Err(ComandaError::OrderClosed { .. })
        ));
        assert!(matches!(
            order.reopen_for_modification(),
            Err(ComandaError::OrderClosed { .. })
        ));
        assert_eq!(order.status(), OrderStatus::Cancelled);
    }

    #[test]
    fn reopen_and_reconfirm_without_changes_keeps_the_total() {
        let catalog = catalog();
        let mut order = Order::new();
        order.add_item(&catalog, "burger", 2).unwrap();
        order.set_delivery(DeliveryMode::Pickup).unwrap();
        order.set_payment(PaymentMethod::Card).unwrap();
        order.confirm().unwrap();
        let before = order.total();

        order.reopen_for_modification().unwrap();
        order.confirm().unwrap();
        assert_eq!(order.total(), before);
        assert_eq!(order.status(), OrderStatus::Confirmed);
    }

    #[test]
    fn grand_total_adds_the_fee_only_for_delivery() {
        let catalog = catalog();
        let mut order = Order::new();
        order.add_item(&catalog, "burger", 1).unwrap();
        order.set_delivery(DeliveryMode::Pickup).unwrap();
        assert_eq!(order.grand_total(dec("3.00")), dec("5.00"));

        order.set_delivery(DeliveryMode::Delivery).unwrap();
        assert_eq!(order.grand_total(dec("3.00")), dec("8.00"));
        assert_eq!(order.total(), dec("5.00"));
    }
}
