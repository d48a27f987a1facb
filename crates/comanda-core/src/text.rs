//! Free-text normalization helpers.
//!
//! Every rule in the classifier and every catalog lookup operates on
//! normalized text, so normalization is the single place where casing,
//! accents and punctuation are dealt with.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Removes combining marks left over after NFD decomposition.
pub fn strip_accents(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}

/// Lower-cases, strips accents, turns punctuation into spaces and collapses
/// runs of whitespace into a single space.
pub fn normalize(input: &str) -> String {
    let lowered = strip_accents(input.trim()).to_lowercase();
    let depunct = NON_WORD.replace_all(&lowered, " ");
    WHITESPACE.replace_all(depunct.trim(), " ").into_owned()
}

/// Keeps at most `max_words` whitespace-separated words.
pub fn clip_words(input: &str, max_words: usize) -> String {
    input
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Slug used as the canonical catalog key for a display name.
pub fn slugify(name: &str) -> String {
    let slug = normalize(name).replace(' ', "_");
    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_accents_and_punctuation() {
        assert_eq!(normalize("  ¡Hóla, Señor!  "), "hola senor");
        assert_eq!(normalize("DOS   milanesas"), "dos milanesas");
    }

    #[test]
    fn normalize_empty_input() {
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("!!!"), "");
    }

    #[test]
    fn clip_words_truncates() {
        assert_eq!(clip_words("uno dos tres cuatro", 2), "uno dos");
        assert_eq!(clip_words("uno", 5), "uno");
    }

    #[test]
    fn slugify_builds_stable_keys() {
        assert_eq!(slugify("Sándwich de Milanesa"), "sandwich_de_milanesa");
        assert_eq!(slugify(""), "item");
    }
}
