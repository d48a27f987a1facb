//! Quantity extraction from normalized message text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Digit quantities, covering the `x2` / `2x` multiplier forms as well as a
/// plain number. The `x NN` suffix form binds backwards to the item mention
/// it follows; the other forms bind forwards.
static QTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bx\s*(\d+)\b|\b(\d+)\s*x\b|\b(\d+)\b").unwrap());

/// Spelled-out small numbers in the shop's locale.
const NUMBER_WORDS: &[(&str, u32)] = &[
    ("un", 1),
    ("una", 1),
    ("uno", 1),
    ("dos", 2),
    ("tres", 3),
    ("cuatro", 4),
    ("cinco", 5),
    ("seis", 6),
    ("siete", 7),
    ("ocho", 8),
    ("nueve", 9),
    ("diez", 10),
];

/// One quantity found in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityMention {
    /// Byte offset of the match in the normalized text.
    pub start: usize,
    /// Byte offset one past the match.
    pub end: usize,
    pub value: u32,
    /// True for the `x NN` suffix form, which binds to the preceding item
    /// mention instead of the following one.
    pub suffix: bool,
}

/// Scans normalized text for quantities, in reading order.
pub fn extract(normalized: &str) -> Vec<QuantityMention> {
    let mut mentions = Vec::new();

    for captures in QTY.captures_iter(normalized) {
        let whole = captures.get(0).map(|m| (m.start(), m.end()));
        let (digits, suffix) = if let Some(m) = captures.get(1) {
            (m.as_str(), true)
        } else if let Some(m) = captures.get(2) {
            (m.as_str(), false)
        } else if let Some(m) = captures.get(3) {
            (m.as_str(), false)
        } else {
            continue;
        };
        if let (Some((start, end)), Ok(value)) = (whole, digits.parse::<u32>()) {
            mentions.push(QuantityMention {
                start,
                end,
                value,
                suffix,
            });
        }
    }

    for (word, value) in NUMBER_WORDS {
        for start in word_occurrences(normalized, word) {
            mentions.push(QuantityMention {
                start,
                end: start + word.len(),
                value: *value,
                suffix: false,
            });
        }
    }

    mentions.sort_by_key(|m| m.start);
    mentions
}

fn word_occurrences(text: &str, word: &str) -> Vec<usize> {
    let mut out = Vec::new();
    for (idx, _) in text.match_indices(word) {
        let before_ok = text[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric() && c != '_');
        let after_ok = text[idx + word.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric() && c != '_');
        if before_ok && after_ok {
            out.push(idx);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_digits_in_order() {
        let found = extract("2 hamburguesas y 3 papas");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].value, 2);
        assert_eq!(found[1].value, 3);
        assert!(found[0].start < found[1].start);
    }

    #[test]
    fn extracts_number_words() {
        let found = extract("dos milanesas y una coca");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].value, 2);
        assert_eq!(found[1].value, 1);
    }

    #[test]
    fn multiplier_prefix_form_binds_forward() {
        let found = extract("2x hamburguesa");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, 2);
        assert!(!found[0].suffix);
    }

    #[test]
    fn multiplier_suffix_form_binds_backward() {
        let found = extract("hamburguesa x2");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, 2);
        assert!(found[0].suffix);

        let spaced = extract("hamburguesa x 2");
        assert_eq!(spaced.len(), 1);
        assert!(spaced[0].suffix);
    }

    #[test]
    fn no_quantities_in_plain_text() {
        assert!(extract("quiero milanesas").is_empty());
    }
}
