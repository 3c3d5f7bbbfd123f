//! Status classification: the decision logic mapping existence evidence,
//! confidence, and discrepancies to a final [`CitationStatus`].
//!
//! Two entry points, because the strength of the evidence differs. A work
//! confirmed by exact DOI lookup exists, full stop; metadata mismatches on
//! it are citation errors, not fabrication, and never downgrade the status
//! below verified. A work matched by fuzzy search is weaker evidence and
//! gets the graded classification.

use crate::{CitationStatus, Discrepancy, Field, RetractionSignal, Severity, SignalNature};

/// Fuzzy-match confidence at which a clean discrepancy set verifies.
const VERIFY_CONFIDENCE: f64 = 0.8;
/// Fuzzy-match confidence floor for verification despite minor noise.
const VERIFY_CONFIDENCE_FLOOR: f64 = 0.7;

/// Status for a work confirmed by DOI lookup.
///
/// A retraction-type signal overrides verified; nothing else does.
pub fn classify_doi_confirmed(retraction: Option<&RetractionSignal>) -> CitationStatus {
    match retraction {
        Some(signal) => status_for_signal(signal.nature),
        None => CitationStatus::Verified,
    }
}

/// Status for a citation resolved through fuzzy search, from the match's
/// confidence and discrepancy set.
pub fn classify_fuzzy(
    confidence: f64,
    discrepancies: &[Discrepancy],
    retraction: Option<&RetractionSignal>,
) -> CitationStatus {
    if let Some(signal) = retraction {
        return status_for_signal(signal.nature);
    }

    let worst = discrepancies.iter().map(|d| d.severity).max();
    if confidence >= VERIFY_CONFIDENCE && worst < Some(Severity::Major) {
        return CitationStatus::Verified;
    }
    if discrepancies
        .iter()
        .any(|d| d.field == Field::Title && d.severity == Severity::Critical)
    {
        return CitationStatus::FakeLikely;
    }
    if discrepancies.iter().any(|d| {
        matches!(d.field, Field::Year | Field::Authors) && d.severity == Severity::Major
    }) {
        return CitationStatus::FakeProbably;
    }
    if confidence >= VERIFY_CONFIDENCE_FLOOR {
        return CitationStatus::Verified;
    }
    CitationStatus::Skip
}

/// Status for a best search hit too weak to count as a match.
///
/// A weak hit is mostly no evidence at all, except when the nearest thing
/// the sources know of is nothing like the citation: a critical title
/// discrepancy against the best candidate is the strongest absence signal
/// the search path can produce.
pub fn classify_weak_match(discrepancies: &[Discrepancy]) -> CitationStatus {
    if discrepancies
        .iter()
        .any(|d| d.field == Field::Title && d.severity == Severity::Critical)
    {
        CitationStatus::FakeLikely
    } else {
        CitationStatus::Skip
    }
}

fn status_for_signal(nature: SignalNature) -> CitationStatus {
    match nature {
        SignalNature::Retraction => CitationStatus::Retracted,
        SignalNature::ExpressionOfConcern => CitationStatus::Concern,
        SignalNature::Correction => CitationStatus::Correction,
    }
}
