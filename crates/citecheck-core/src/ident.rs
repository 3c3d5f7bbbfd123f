//! Identifier normalization for DOIs and PMIDs.
//!
//! Normalized identifiers are used both as lookup keys against the sources
//! and as cache keys, so normalization must be idempotent:
//! `normalize_doi(normalize_doi(x)) == normalize_doi(x)`.

use once_cell::sync::Lazy;
use regex::Regex;

static DOI_RESOLVER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://(?:dx\.)?doi\.org/").expect("valid regex"));

/// Punctuation that clings to identifiers extracted from running text.
const TRAILING_PUNCT: &[char] = &['.', ',', ';', ':', ')', ']', '}', '>'];

/// Canonicalize a DOI supplied through an API or structured field.
///
/// Lowercases, trims, and strips a leading `http(s)://doi.org/` resolver
/// prefix. Returns `None` for values that mean "no DOI": the empty string,
/// `"0"`, and the literal `"unavailable"`.
pub fn normalize_doi(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let stripped = DOI_RESOLVER_PREFIX.replace(&lowered, "");
    let doi = stripped.trim();
    match doi {
        "" | "0" | "unavailable" => None,
        _ => Some(doi.to_string()),
    }
}

/// Canonicalize a DOI extracted from free text.
///
/// Like [`normalize_doi`], but additionally strips trailing punctuation
/// (`. , ; : ) ] } >`) that sentence context attaches to the identifier.
/// API-supplied DOIs keep their punctuation and must go through
/// [`normalize_doi`] instead.
pub fn normalize_doi_from_text(raw: &str) -> Option<String> {
    let doi = normalize_doi(raw)?;
    let trimmed = doi.trim_end_matches(TRAILING_PUNCT);
    match trimmed {
        "" | "0" | "unavailable" => None,
        _ => Some(trimmed.to_string()),
    }
}

/// Canonicalize a PubMed identifier: digits only.
///
/// Accepts an optional `pmid:` prefix. Returns `None` for empty, zero, or
/// non-numeric input.
pub fn normalize_pmid(raw: &str) -> Option<String> {
    let s = raw.trim();
    let s = s
        .strip_prefix("pmid:")
        .or_else(|| s.strip_prefix("PMID:"))
        .unwrap_or(s)
        .trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let s = s.trim_start_matches('0');
    if s.is_empty() {
        return None;
    }
    Some(s.to_string())
}

/// Extract a DOI from a bare URL, if it is a `doi.org` resolver URL.
///
/// Page-extracted URLs count as free text, so trailing punctuation is
/// stripped. Any other URL yields `None`.
pub fn doi_from_url(url: &str) -> Option<String> {
    let lowered = url.trim().to_lowercase();
    if !DOI_RESOLVER_PREFIX.is_match(&lowered) {
        return None;
    }
    normalize_doi_from_text(&lowered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_protocol_prefix_and_case() {
        assert_eq!(
            normalize_doi("HTTPS://DOI.ORG/10.1000/182").as_deref(),
            Some("10.1000/182")
        );
        assert_eq!(
            normalize_doi("http://dx.doi.org/10.1000/182").as_deref(),
            Some("10.1000/182")
        );
    }

    #[test]
    fn free_text_strips_trailing_punctuation() {
        assert_eq!(
            normalize_doi_from_text("HTTPS://DOI.ORG/10.1000/182.").as_deref(),
            Some("10.1000/182")
        );
        assert_eq!(
            normalize_doi_from_text("10.1234/abc);").as_deref(),
            Some("10.1234/abc")
        );
    }

    #[test]
    fn api_supplied_keeps_punctuation() {
        // A registered DOI may legitimately end in a dot.
        assert_eq!(normalize_doi("10.1000/182.").as_deref(), Some("10.1000/182."));
    }

    #[test]
    fn absent_values() {
        assert!(normalize_doi("").is_none());
        assert!(normalize_doi("   ").is_none());
        assert!(normalize_doi("0").is_none());
        assert!(normalize_doi("unavailable").is_none());
        assert!(normalize_doi("UNAVAILABLE").is_none());
        assert!(normalize_doi_from_text(".").is_none());
    }

    #[test]
    fn idempotent() {
        for raw in ["HTTPS://DOI.ORG/10.1000/182", "10.1000/Heavy.CASE", "0"] {
            let once = normalize_doi(raw);
            let twice = once.as_deref().and_then(normalize_doi);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn pmid_digits_only() {
        assert_eq!(normalize_pmid("12345").as_deref(), Some("12345"));
        assert_eq!(normalize_pmid("PMID: 12345").as_deref(), Some("12345"));
        assert_eq!(normalize_pmid("pmid:0012345").as_deref(), Some("12345"));
        assert!(normalize_pmid("12a45").is_none());
        assert!(normalize_pmid("0").is_none());
        assert!(normalize_pmid("").is_none());
    }

    #[test]
    fn doi_from_resolver_url() {
        assert_eq!(
            doi_from_url("https://doi.org/10.1000/182.").as_deref(),
            Some("10.1000/182")
        );
        assert!(doi_from_url("https://example.com/10.1000/182").is_none());
        assert!(doi_from_url("not a url").is_none());
    }
}
