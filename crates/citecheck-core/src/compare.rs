//! Fuzzy metadata comparison between a provided citation and a retrieved
//! work, and best-match selection over search candidates.
//!
//! Only fields present on both sides are compared: absence of a field is
//! never evidence of fabrication.

use crate::matching::token_set_similarity;
use crate::{CitationInput, Discrepancy, Field, Severity, WorkRecord};

/// Title similarity below this is a discrepancy at all.
const TITLE_MATCH_THRESHOLD: f64 = 0.9;
/// Title similarity below this upgrades the discrepancy to critical.
const TITLE_CRITICAL_THRESHOLD: f64 = 0.5;
/// First-author similarity below this is a major discrepancy.
const AUTHOR_MATCH_THRESHOLD: f64 = 0.7;
/// Journal similarity below this is a minor discrepancy.
const JOURNAL_MATCH_THRESHOLD: f64 = 0.7;
/// Year differences beyond this many years are major rather than minor.
const YEAR_MINOR_WINDOW: i32 = 2;

/// Compute per-field discrepancies between provided and retrieved metadata.
pub fn compare(provided: &CitationInput, actual: &WorkRecord) -> Vec<Discrepancy> {
    let mut discrepancies = Vec::new();

    if let Some(title) = provided.title.as_deref().filter(|t| !t.trim().is_empty())
        && !actual.title.is_empty()
    {
        let similarity = token_set_similarity(title, &actual.title);
        if similarity < TITLE_MATCH_THRESHOLD {
            discrepancies.push(Discrepancy {
                field: Field::Title,
                provided: title.to_string(),
                actual: actual.title.clone(),
                severity: if similarity < TITLE_CRITICAL_THRESHOLD {
                    Severity::Critical
                } else {
                    Severity::Major
                },
            });
        }
    }

    if let Some(year) = provided.year
        && actual.year != 0
        && year != actual.year
    {
        discrepancies.push(Discrepancy {
            field: Field::Year,
            provided: year.to_string(),
            actual: actual.year.to_string(),
            severity: if (year - actual.year).abs() > YEAR_MINOR_WINDOW {
                Severity::Major
            } else {
                Severity::Minor
            },
        });
    }

    if let Some(first_author) = provided.authors.first().filter(|a| !a.trim().is_empty())
        && let Some(actual_author) = actual.authors.first()
        && !actual_author.display_name.is_empty()
    {
        let similarity = token_set_similarity(first_author, &actual_author.display_name);
        if similarity < AUTHOR_MATCH_THRESHOLD {
            discrepancies.push(Discrepancy {
                field: Field::Authors,
                provided: first_author.clone(),
                actual: actual_author.display_name.clone(),
                severity: Severity::Major,
            });
        }
    }

    if let Some(journal) = provided.journal.as_deref().filter(|j| !j.trim().is_empty())
        && let Some(actual_journal) = actual.journal.as_deref()
    {
        let similarity = token_set_similarity(journal, actual_journal);
        if similarity < JOURNAL_MATCH_THRESHOLD {
            discrepancies.push(Discrepancy {
                field: Field::Journal,
                provided: journal.to_string(),
                actual: actual_journal.to_string(),
                severity: Severity::Minor,
            });
        }
    }

    discrepancies
}

/// Weighted match score of one search candidate against the citation.
///
/// `0.5·title + 0.3·first author + 0.2·year`. A provided field missing on
/// either side contributes its weight as zero.
pub fn match_score(provided: &CitationInput, candidate: &WorkRecord) -> f64 {
    let title_sim = match provided.title.as_deref() {
        Some(title) => token_set_similarity(title, &candidate.title),
        None => 0.0,
    };
    let author_sim = match (provided.authors.first(), candidate.authors.first()) {
        (Some(a), Some(b)) if !a.trim().is_empty() && !b.display_name.is_empty() => {
            token_set_similarity(a, &b.display_name)
        }
        _ => 0.0,
    };
    let year_match = match provided.year {
        Some(year) if candidate.year != 0 && year == candidate.year => 1.0,
        _ => 0.0,
    };
    0.5 * title_sim + 0.3 * author_sim + 0.2 * year_match
}

/// Select the best-scoring candidate; ties keep the first-seen candidate.
pub fn best_match<'a>(
    provided: &CitationInput,
    candidates: &'a [WorkRecord],
) -> Option<(&'a WorkRecord, f64)> {
    let mut best: Option<(&WorkRecord, f64)> = None;
    for candidate in candidates {
        let score = match_score(provided, candidate);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((candidate, score)),
        }
    }
    best
}
