//! Ticket-file order sink.
//!
//! Persists each confirmed order as a numbered kitchen ticket and rewrites
//! the latest-ticket file the printer watches. Ticket numbers come from a
//! counter file guarded by an exclusive lock, so concurrent confirmations
//! from different sessions never share a number.

use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use fs2::FileExt;

use comanda_core::order::{DeliveryMode, OrderSink, OrderSnapshot};
use comanda_core::{ComandaError, Result};

const COUNTER_FILE: &str = "counter.txt";
const LATEST_TICKET_FILE: &str = "comanda.txt";
const TICKETS_DIR: &str = "tickets";

/// Writes confirmed orders to ticket files under a data directory.
pub struct TicketWriter {
    data_dir: PathBuf,
    business_name: String,
    eta_minutes: u32,
}

impl TicketWriter {
    pub fn new(data_dir: impl Into<PathBuf>, business_name: impl Into<String>, eta_minutes: u32) -> Self {
        Self {
            data_dir: data_dir.into(),
            business_name: business_name.into(),
            eta_minutes,
        }
    }

    /// Bumps the persistent counter and returns the fresh ticket number.
    fn next_ticket_number(&self) -> Result<u64> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.data_dir.join(COUNTER_FILE);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        file.lock_exclusive()
            .map_err(|err| ComandaError::io(format!("counter lock: {err}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        let current: u64 = contents.trim().parse().unwrap_or(0);
        let next = current + 1;

        file.seek(SeekFrom::Start(0))?;
        file.set_len(0)?;
        file.write_all(next.to_string().as_bytes())?;
        // Lock is released when the handle drops.
        Ok(next)
    }

    fn render(&self, snapshot: &OrderSnapshot, number: u64) -> String {
        let mut lines = Vec::new();
        let title = if snapshot.modified {
            "PEDIDO MODIFICADO"
        } else {
            "PEDIDO"
        };
        lines.push(format!("{} - {}", self.business_name, title));
        lines.push(format!(
            "Fecha: {}",
            snapshot.confirmed_at.format("%Y-%m-%d %H:%M:%S")
        ));
        lines.push(format!("Pedido #{number}"));
        lines.push(format!("Cliente: {}", snapshot.customer_id));
        lines.push(String::new());
        lines.push("Items:".to_string());
        for line in &snapshot.lines {
            lines.push(format!(
                "- {} x {}  (${} c/u)",
                line.quantity, line.display_name, line.unit_price
            ));
        }
        lines.push(String::new());
        match snapshot.delivery {
            DeliveryMode::Delivery => {
                lines.push("Entrega: ENVIO".to_string());
                lines.push(format!(
                    "Direccion: {}",
                    snapshot.address.as_deref().unwrap_or("-")
                ));
                if let Some(fee) = snapshot.delivery_fee {
                    lines.push(format!("Envio: ${fee}"));
                }
            }
            DeliveryMode::Pickup => lines.push("Entrega: RETIRO".to_string()),
        }
        lines.push(format!("Pago: {}", snapshot.payment.label()));
        lines.push(format!("Total: ${}", snapshot.grand_total));
        lines.push(format!("Demora: {} min", self.eta_minutes));
        if !snapshot.notes.is_empty() {
            lines.push(String::new());
            lines.push("NOTAS:".to_string());
            for note in &snapshot.notes {
                lines.push(format!("* {note}"));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

#[async_trait]
impl OrderSink for TicketWriter {
    async fn deliver(&self, snapshot: &OrderSnapshot) -> Result<u64> {
        let number = match snapshot.ticket_number {
            Some(number) => number,
            None => self
                .next_ticket_number()
                .map_err(|err| ComandaError::persistence_handoff(err.to_string()))?,
        };
        let text = self.render(snapshot, number);

        let write = || -> std::io::Result<()> {
            let tickets_dir = self.data_dir.join(TICKETS_DIR);
            fs::create_dir_all(&tickets_dir)?;
            fs::write(tickets_dir.join(format!("pedido_{number:05}.txt")), &text)?;
            fs::write(self.data_dir.join(LATEST_TICKET_FILE), &text)?;
            Ok(())
        };
        write().map_err(|err| ComandaError::persistence_handoff(err.to_string()))?;

        tracing::info!(
            ticket = number,
            customer_id = %snapshot.customer_id,
            modified = snapshot.modified,
            "order ticket written"
        );
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use comanda_core::order::{PaymentMethod, SnapshotLine};

    fn snapshot(ticket_number: Option<u64>, modified: bool) -> OrderSnapshot {
        OrderSnapshot {
            customer_id: "549110001111".to_string(),
            ticket_number,
            lines: vec![SnapshotLine {
                display_name: "Burger".to_string(),
                quantity: 2,
                unit_price: "5.00".parse().unwrap(),
                line_total: "10.00".parse().unwrap(),
            }],
            items_total: "10.00".parse().unwrap(),
            delivery_fee: None,
            grand_total: "10.00".parse().unwrap(),
            delivery: DeliveryMode::Pickup,
            address: None,
            payment: PaymentMethod::Cash,
            notes: vec!["sin cebolla".to_string()],
            modified,
            confirmed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn assigns_sequential_ticket_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TicketWriter::new(dir.path(), "Pincho", 20);

        assert_eq!(writer.deliver(&snapshot(None, false)).await.unwrap(), 1);
        assert_eq!(writer.deliver(&snapshot(None, false)).await.unwrap(), 2);

        let counter = fs::read_to_string(dir.path().join(COUNTER_FILE)).unwrap();
        assert_eq!(counter.trim(), "2");
    }

    #[tokio::test]
    async fn reuses_the_number_for_modified_reconfirmations() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TicketWriter::new(dir.path(), "Pincho", 20);

        let first = writer.deliver(&snapshot(None, false)).await.unwrap();
        let again = writer.deliver(&snapshot(Some(first), true)).await.unwrap();
        assert_eq!(again, first);

        let latest = fs::read_to_string(dir.path().join(LATEST_TICKET_FILE)).unwrap();
        assert!(latest.contains("PEDIDO MODIFICADO"));
        assert!(latest.contains(&format!("Pedido #{first}")));
    }

    #[tokio::test]
    async fn ticket_contains_lines_totals_and_notes() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TicketWriter::new(dir.path(), "Pincho", 20);
        writer.deliver(&snapshot(None, false)).await.unwrap();

        let ticket = fs::read_to_string(dir.path().join(TICKETS_DIR).join("pedido_00001.txt")).unwrap();
        assert!(ticket.contains("- 2 x Burger  ($5.00 c/u)"));
        assert!(ticket.contains("Total: $10.00"));
        assert!(ticket.contains("Entrega: RETIRO"));
        assert!(ticket.contains("* sin cebolla"));
        assert!(ticket.contains("Demora: 20 min"));
    }
}
