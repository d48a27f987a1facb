//! Catalog source loading.
//!
//! The menu is a line-oriented text file, `DisplayName = price` per item.
//! Synonyms are `canonicalKey|alias1,alias2,...` per line. Blank lines and
//! `#` comments are ignored in both. Any malformed line fails the load:
//! catalog problems are fatal at startup, never per-message surprises.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;

use comanda_core::catalog::{AliasIndex, Catalog, CatalogEntry};
use comanda_core::{ComandaError, Result};

/// Loads and parses the menu file.
pub fn load_menu(path: &Path) -> Result<Catalog> {
    let source_name = path.display().to_string();
    let source = fs::read_to_string(path)
        .map_err(|err| ComandaError::catalog_load(&source_name, 0, err.to_string()))?;
    parse_menu(&source, &source_name)
}

/// Parses menu source text into a catalog.
pub fn parse_menu(source: &str, source_name: &str) -> Result<Catalog> {
    let mut entries = Vec::new();
    let mut seen_keys = HashSet::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, price_text)) = line.split_once('=') else {
            return Err(ComandaError::catalog_load(
                source_name,
                idx + 1,
                "expected 'DisplayName = price'",
            ));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(ComandaError::catalog_load(
                source_name,
                idx + 1,
                "item name is empty",
            ));
        }
        let Some(price) = parse_price(price_text) else {
            return Err(ComandaError::catalog_load(
                source_name,
                idx + 1,
                format!("invalid price '{}'", price_text.trim()),
            ));
        };
        if price < Decimal::ZERO {
            return Err(ComandaError::catalog_load(
                source_name,
                idx + 1,
                format!("negative price for '{name}'"),
            ));
        }
        let entry = CatalogEntry::new(name, price);
        if !seen_keys.insert(entry.key.clone()) {
            return Err(ComandaError::catalog_load(
                source_name,
                idx + 1,
                format!("duplicate canonical key '{}'", entry.key),
            ));
        }
        entries.push(entry);
    }

    Catalog::from_entries(entries)
}

/// Loads the synonyms file and builds the alias index.
///
/// A missing file is fine (the catalog's display names are still indexed);
/// a malformed file or an alias pointing at an unknown key is not.
pub fn load_aliases(path: &Path, catalog: &Catalog) -> Result<AliasIndex> {
    if !path.exists() {
        return AliasIndex::build(catalog, &[]);
    }
    let source_name = path.display().to_string();
    let source = fs::read_to_string(path)
        .map_err(|err| ComandaError::catalog_load(&source_name, 0, err.to_string()))?;
    let synonyms = parse_synonyms(&source, &source_name)?;
    AliasIndex::build(catalog, &synonyms)
}

/// Parses synonyms source text into `(canonical key, aliases)` pairs.
pub fn parse_synonyms(source: &str, source_name: &str) -> Result<Vec<(String, Vec<String>)>> {
    let mut out = Vec::new();
    for (idx, raw_line) in source.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, rest)) = line.split_once('|') else {
            return Err(ComandaError::catalog_load(
                source_name,
                idx + 1,
                "expected 'canonicalKey|alias1,alias2,...'",
            ));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(ComandaError::catalog_load(
                source_name,
                idx + 1,
                "canonical key is empty",
            ));
        }
        let aliases: Vec<String> = rest
            .split(',')
            .map(|alias| alias.trim().to_string())
            .filter(|alias| !alias.is_empty())
            .collect();
        out.push((key.to_string(), aliases));
    }
    Ok(out)
}

/// Accepts "5.00", "$5.00" and "$ 5.00".
fn parse_price(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().trim_start_matches('$').replace(' ', "");
    cleaned.parse().ok()
}
