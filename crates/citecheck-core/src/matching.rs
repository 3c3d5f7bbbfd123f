//! Text normalization and fuzzy similarity for bibliographic fields.
//!
//! Normalization keeps minor variations (diacritics, case, punctuation)
//! from registering as discrepancies and gives cache keys a stable form.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalize a title or name for comparison and cache keying.
///
/// NFKD-decomposes, strips combining marks (so `é` compares equal to `e`),
/// lowercases, and maps every non-alphanumeric character to a space.
pub fn normalize_title(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Tokens that survive normalization: words longer than two characters.
///
/// Short tokens ("of", "a", "in") carry no identifying signal and would
/// inflate overlap between unrelated titles.
fn tokens(text: &str) -> HashSet<String> {
    normalize_title(text)
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// Token-overlap similarity: |A ∩ B| / |A ∪ B| over normalized word sets.
///
/// Two texts with no usable tokens on either side compare equal (1.0);
/// usable tokens on exactly one side compare as 0.0.
pub fn token_set_similarity(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    intersection as f64 / union as f64
}
