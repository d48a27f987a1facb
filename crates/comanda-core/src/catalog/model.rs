//! Catalog domain model.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ComandaError, Result};
use crate::text;

/// A single menu item, immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Canonical unique id, the slug of the display name.
    pub key: String,
    /// Name shown to customers and printed on tickets.
    pub display_name: String,
    /// Unit price. Never negative.
    pub price: Decimal,
}

impl CatalogEntry {
    /// Creates an entry, deriving the canonical key from the display name.
    pub fn new(display_name: impl Into<String>, price: Decimal) -> Self {
        let display_name = display_name.into();
        Self {
            key: text::slugify(&display_name),
            display_name,
            price,
        }
    }
}

/// The loaded menu, kept in file order so summaries and the menu message
/// list items the way the owner wrote them.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_key: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog from entries, rejecting duplicate canonical keys and
    /// negative prices.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut by_key = HashMap::with_capacity(entries.len());
        for (idx, entry) in entries.iter().enumerate() {
            if entry.price < Decimal::ZERO {
                return Err(ComandaError::catalog_load(
                    "catalog",
                    idx + 1,
                    format!("negative price for '{}'", entry.display_name),
                ));
            }
            if by_key.insert(entry.key.clone(), idx).is_some() {
                return Err(ComandaError::catalog_load(
                    "catalog",
                    idx + 1,
                    format!("duplicate canonical key '{}'", entry.key),
                ));
            }
        }
        Ok(Self { entries, by_key })
    }

    /// All entries in display order.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Looks up an entry by canonical key.
    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.by_key.get(key).map(|idx| &self.entries[*idx])
    }

    /// Whether the catalog has an entry for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
