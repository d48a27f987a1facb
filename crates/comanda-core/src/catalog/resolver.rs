//! Alias resolution: free-text tokens to catalog keys.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::catalog::model::Catalog;
use crate::error::{ComandaError, Result};
use crate::text;

/// One recognized item occurrence inside a normalized message.
///
/// `keys` holds every catalog key the matched alias resolves to; more than
/// one key means the alias is ambiguous and the caller must ask the customer
/// instead of guessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMention {
    /// Byte offset of the match in the normalized text.
    pub start: usize,
    /// Byte offset one past the match.
    pub end: usize,
    /// Candidate catalog keys for the matched alias.
    pub keys: BTreeSet<String>,
}

/// Mapping from normalized alias text to catalog keys.
///
/// Every catalog entry contributes its normalized display name as an
/// implicit alias; the synonyms source adds the rest. Each alias is also
/// indexed under simple surface variants (trailing `s`/`es` plural, the
/// sandwich/sanguche spelling swap) so everyday phrasing still resolves.
#[derive(Debug, Clone, Default)]
pub struct AliasIndex {
    aliases: HashMap<String, BTreeSet<String>>,
}

impl AliasIndex {
    /// Builds the index from the catalog plus `(canonical key, aliases)`
    /// pairs from the synonyms source.
    ///
    /// A pair referencing a key absent from the catalog fails the build;
    /// the index must never point outside the catalog.
    pub fn build(catalog: &Catalog, synonyms: &[(String, Vec<String>)]) -> Result<Self> {
        let mut index = Self::default();
        for entry in catalog.entries() {
            index.insert(&text::normalize(&entry.display_name), &entry.key);
        }
        for (line, (key, aliases)) in synonyms.iter().enumerate() {
            if !catalog.contains(key) {
                return Err(ComandaError::catalog_load(
                    "synonyms",
                    line + 1,
                    format!("alias target '{key}' is not a catalog entry"),
                ));
            }
            for alias in aliases {
                index.insert(&text::normalize(alias), key);
            }
        }
        Ok(index)
    }

    fn insert(&mut self, alias: &str, key: &str) {
        if alias.is_empty() {
            return;
        }
        for variant in surface_variants(alias) {
            self.aliases
                .entry(variant)
                .or_default()
                .insert(key.to_string());
        }
    }

    /// Resolves a single free-text token to zero-or-more catalog keys.
    ///
    /// Zero matches is not an error; it signals "no item recognized".
    /// More than one match is an ambiguity the caller must surface.
    pub fn resolve(&self, token: &str) -> BTreeSet<String> {
        self.aliases
            .get(&text::normalize(token))
            .cloned()
            .unwrap_or_default()
    }

    /// Finds every word-bounded alias occurrence in already-normalized text,
    /// in reading order. Longer matches win over shorter overlapping ones,
    /// so "papas fritas" is one mention rather than a "papas" mention plus
    /// leftovers.
    pub fn scan(&self, normalized: &str) -> Vec<ItemMention> {
        let mut candidates: Vec<(usize, usize, &BTreeSet<String>)> = Vec::new();
        for (alias, keys) in &self.aliases {
            for start in word_bounded_occurrences(normalized, alias) {
                candidates.push((start, start + alias.len(), keys));
            }
        }
        // Longest first, then leftmost, so overlap resolution is deterministic.
        candidates.sort_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)).then(a.0.cmp(&b.0)));

        let mut taken: Vec<(usize, usize, &BTreeSet<String>)> = Vec::new();
        for candidate in candidates {
            let overlaps = taken
                .iter()
                .any(|t| candidate.0 < t.1 && t.0 < candidate.1);
            if !overlaps {
                taken.push(candidate);
            }
        }
        taken.sort_by_key(|t| t.0);
        taken
            .into_iter()
            .map(|(start, end, keys)| ItemMention {
                start,
                end,
                keys: keys.clone(),
            })
            .collect()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn word_bounded_occurrences(text: &str, needle: &str) -> Vec<usize> {
    let mut out = Vec::new();
    if needle.is_empty() {
        return out;
    }
    for (idx, _) in text.match_indices(needle) {
        let before_ok = text[..idx].chars().next_back().is_none_or(|c| !is_word_char(c));
        let after_ok = text[idx + needle.len()..]
            .chars()
            .next()
            .is_none_or(|c| !is_word_char(c));
        if before_ok && after_ok {
            out.push(idx);
        }
    }
    out
}

fn surface_variants(alias: &str) -> BTreeSet<String> {
    let mut bases = BTreeSet::new();
    bases.insert(alias.to_string());
    if alias.contains("sandwich") {
        bases.insert(alias.replace("sandwich", "sanguche"));
    }
    if alias.contains("sanguche") {
        bases.insert(alias.replace("sanguche", "sandwich"));
    }

    let mut variants = BTreeSet::new();
    for base in bases {
        variants.insert(format!("{base}s"));
        variants.insert(format!("{base}es"));
        variants.insert(base);
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::CatalogEntry;

    fn sample_catalog() -> Catalog {
        Catalog::from_entries(vec![
            CatalogEntry::new("Burger", "5.00".parse().unwrap()),
            CatalogEntry::new("Papas Fritas", "2.00".parse().unwrap()),
            CatalogEntry::new("Sandwich de Milanesa", "4.50".parse().unwrap()),
        ])
        .unwrap()
    }

    fn sample_index() -> AliasIndex {
        AliasIndex::build(
            &sample_catalog(),
            &[
                (
                    "burger".to_string(),
                    vec!["burguer".to_string(), "hamburguesa".to_string()],
                ),
                ("papas_fritas".to_string(), vec!["papas".to_string()]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn resolves_display_names_and_synonyms() {
        let index = sample_index();
        assert_eq!(index.resolve("Burger").len(), 1);
        assert!(index.resolve("hamburguesa").contains("burger"));
        assert!(index.resolve("burguer").contains("burger"));
        assert!(index.resolve("milanesa").is_empty());
    }

    #[test]
    fn resolve_handles_plural_surface_forms() {
        let index = sample_index();
        assert!(index.resolve("hamburguesas").contains("burger"));
        assert!(index.resolve("PAPAS").contains("papas_fritas"));
    }

    #[test]
    fn resolve_is_idempotent() {
        let index = sample_index();
        assert_eq!(index.resolve("hamburguesas"), index.resolve("hamburguesas"));
    }

    #[test]
    fn sanguche_spelling_swap_is_indexed() {
        let index = sample_index();
        assert!(index.resolve("sanguche de milanesa").contains("sandwich_de_milanesa"));
    }

    #[test]
    fn unknown_synonym_target_fails_the_build() {
        let err = AliasIndex::build(
            &sample_catalog(),
            &[("pizza".to_string(), vec!["muzza".to_string()])],
        )
        .unwrap_err();
        assert!(err.is_catalog_load());
    }

    #[test]
    fn scan_prefers_the_longest_match() {
        let index = sample_index();
        let mentions = index.scan("unas papas fritas por favor");
        assert_eq!(mentions.len(), 1);
        assert!(mentions[0].keys.contains("papas_fritas"));
        assert_eq!(&"unas papas fritas por favor"[mentions[0].start..mentions[0].end], "papas fritas");
    }

    #[test]
    fn scan_reports_ambiguous_aliases() {
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new("Combo Clasico", "7.00".parse().unwrap()),
            CatalogEntry::new("Combo Doble", "9.00".parse().unwrap()),
        ])
        .unwrap();
        let index = AliasIndex::build(
            &catalog,
            &[
                ("combo_clasico".to_string(), vec!["combo".to_string()]),
                ("combo_doble".to_string(), vec!["combo".to_string()]),
            ],
        )
        .unwrap();

        let mentions = index.scan("quiero un combo");
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].keys.len(), 2);
    }

    #[test]
    fn scan_requires_word_boundaries() {
        let index = sample_index();
        assert!(index.scan("burgerizado").is_empty());
    }
}
