//! The lookup orchestrator: sequences the two sources with fallback and
//! collapses their three-way outcomes into a single verification result.
//!
//! The asymmetry here is the module's central correctness property. DOI
//! existence in any reputable source is conclusive, regardless of metadata
//! mismatches — a found DOI with a wrong title is a citation error, not a
//! nonexistent paper. Absence requires either two independent
//! confirmations or one confirmation plus an inconclusive second source;
//! two inconclusive results degrade to "cannot determine", never to
//! "likely fake".

use std::sync::Arc;

use crate::sources::{CrossRefClient, LookupOutcome, OpenAlexClient, SourceClient};
use crate::{
    CitationInput, CitationStatus, Config, CoreError, Discrepancy, Field, Severity, SourceTag,
    VerificationResult, WorkRecord, classify, compare, ident, retraction, score,
};

/// Minimum best-candidate match score for a fuzzy search hit to count as
/// the cited work.
const MATCH_THRESHOLD: f64 = 0.7;

/// Verifies single citations against the primary and secondary sources.
///
/// Clients are injected at construction; [`Verifier::new`] wires the real
/// CrossRef/OpenAlex pair from a [`Config`].
pub struct Verifier {
    primary: Arc<dyn SourceClient>,
    secondary: Arc<dyn SourceClient>,
}

impl Verifier {
    pub fn new(config: &Config) -> Result<Self, CoreError> {
        Ok(Self::with_clients(
            Arc::new(CrossRefClient::new(config)?),
            Arc::new(OpenAlexClient::new(config)?),
        ))
    }

    pub fn with_clients(
        primary: Arc<dyn SourceClient>,
        secondary: Arc<dyn SourceClient>,
    ) -> Self {
        Self { primary, secondary }
    }

    /// Verify one citation.
    ///
    /// Routing: a DOI (from the `doi` field or a `doi.org` URL) takes the
    /// exact-lookup path; otherwise a non-empty title takes the fuzzy
    /// search path; otherwise there is no usable evidence and the result
    /// is a skip. Infallible per citation: the worst outcome is skip.
    pub async fn verify(&self, input: &CitationInput) -> VerificationResult {
        let doi = input
            .doi
            .as_deref()
            .and_then(ident::normalize_doi_from_text)
            .or_else(|| input.url.as_deref().and_then(ident::doi_from_url));

        if let Some(doi) = doi {
            return self.verify_doi(&doi, input).await;
        }
        if input.title.as_deref().is_some_and(|t| !t.trim().is_empty()) {
            return self.verify_search(input).await;
        }
        log::debug!("citation has no usable identifying field; skipping");
        VerificationResult::skip()
    }

    /// Exact-DOI path: primary first, secondary only when the primary did
    /// not find the work. The secondary is never dispatched speculatively.
    async fn verify_doi(&self, doi: &str, input: &CitationInput) -> VerificationResult {
        let primary_outcome = match self.primary.get_work(doi).await {
            LookupOutcome::Found(work) => {
                return self.confirmed(work, SourceTag::Primary, input);
            }
            other => other,
        };
        log::debug!(
            "{}: {doi} not confirmed, falling back to {}",
            self.primary.name(),
            self.secondary.name()
        );

        let secondary_outcome = match self.secondary.get_work(doi).await {
            LookupOutcome::Found(work) => {
                return self.confirmed(work, SourceTag::Secondary, input);
            }
            other => other,
        };

        match (primary_outcome, secondary_outcome) {
            // No source could establish existence either way; must not be
            // reported as fake.
            (LookupOutcome::Error(p), LookupOutcome::Error(s)) => {
                log::info!("no source reachable for {doi} ({p}; {s}); skipping");
                VerificationResult::skip()
            }
            // At least one positive "does not exist": sufficient signal
            // once the fallback chain is exhausted.
            _ => {
                log::info!("{doi} not found in any source");
                VerificationResult {
                    exists: false,
                    confidence: 0.0,
                    source: SourceTag::None,
                    work: None,
                    discrepancies: vec![Discrepancy {
                        field: Field::Doi,
                        provided: doi.to_string(),
                        actual: "not found".to_string(),
                        severity: Severity::Critical,
                    }],
                    retraction: None,
                    status: CitationStatus::FakeLikely,
                }
            }
        }
    }

    /// Fuzzy path for DOI-less citations: search, select the best
    /// candidate, and classify with the weaker-evidence rules.
    async fn verify_search(&self, input: &CitationInput) -> VerificationResult {
        let title = input.title.as_deref().unwrap_or_default();
        let first_author = input.authors.first().map(String::as_str);

        let mut source = SourceTag::Primary;
        let mut candidates = self.primary.search(title, first_author, input.year).await;
        if candidates.is_empty() {
            source = SourceTag::Secondary;
            candidates = self.secondary.search(title, first_author, input.year).await;
        }

        let Some((work, match_score)) = compare::best_match(input, &candidates) else {
            log::debug!("no search candidates for {title:?}; skipping");
            return VerificationResult::skip();
        };

        let discrepancies = compare::compare(input, work);
        let confidence = score::confidence(&discrepancies);

        if match_score > MATCH_THRESHOLD {
            let retraction = retraction::detect(work);
            let status = classify::classify_fuzzy(confidence, &discrepancies, retraction.as_ref());
            return VerificationResult {
                exists: !matches!(status, CitationStatus::Skip) && !status.is_accusation(),
                confidence,
                source,
                work: Some(work.clone()),
                discrepancies,
                retraction,
                status,
            };
        }

        // Below the match threshold the hit is not the cited work; the only
        // evidence it can still carry is a damning title mismatch.
        match classify::classify_weak_match(&discrepancies) {
            CitationStatus::Skip => VerificationResult::skip(),
            status => VerificationResult {
                exists: false,
                confidence,
                source,
                work: Some(work.clone()),
                discrepancies,
                retraction: None,
                status,
            },
        }
    }

    /// A DOI-confirmed work: verified (or retraction-overridden), with
    /// metadata discrepancies attached for display only.
    fn confirmed(
        &self,
        work: WorkRecord,
        source: SourceTag,
        input: &CitationInput,
    ) -> VerificationResult {
        let retraction = retraction::detect(&work);
        let discrepancies = compare::compare(input, &work);
        let status = classify::classify_doi_confirmed(retraction.as_ref());
        if !discrepancies.is_empty() {
            log::debug!(
                "{} confirmed {} with {} metadata discrepancies",
                self.secondary_or_primary_name(source),
                work.doi,
                discrepancies.len()
            );
        }
        VerificationResult {
            exists: true,
            confidence: 1.0,
            source,
            work: Some(work),
            discrepancies,
            retraction,
            status,
        }
    }

    fn secondary_or_primary_name(&self, source: SourceTag) -> &'static str {
        match source {
            SourceTag::Secondary => self.secondary.name(),
            _ => self.primary.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkUpdate;
    use crate::testutil::{StubSource, sample_work};

    fn verifier(primary: StubSource, secondary: StubSource) -> (Verifier, Arc<StubSource>, Arc<StubSource>) {
        let primary = Arc::new(primary);
        let secondary = Arc::new(secondary);
        (
            Verifier::with_clients(primary.clone(), secondary.clone()),
            primary,
            secondary,
        )
    }

    fn doi_input(doi: &str) -> CitationInput {
        CitationInput {
            doi: Some(doi.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn primary_found_short_circuits_secondary() {
        let work = sample_work("10.1/real", "A Real Paper", "Jane Doe", 2020);
        let (v, _, secondary) = verifier(
            StubSource::found("primary", work),
            StubSource::not_found("secondary"),
        );
        let result = v.verify(&doi_input("10.1/real")).await;
        assert!(result.exists);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.source, SourceTag::Primary);
        assert_eq!(result.status, CitationStatus::Verified);
        assert_eq!(secondary.get_calls(), 0);
    }

    #[tokio::test]
    async fn secondary_found_after_primary_not_found() {
        let work = sample_work("10.1/real", "A Real Paper", "Jane Doe", 2020);
        let (v, primary, secondary) = verifier(
            StubSource::not_found("primary"),
            StubSource::found("secondary", work),
        );
        let result = v.verify(&doi_input("10.1/real")).await;
        assert!(result.exists);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.source, SourceTag::Secondary);
        assert_eq!(result.status, CitationStatus::Verified);
        assert_eq!(primary.get_calls(), 1);
        assert_eq!(secondary.get_calls(), 1);
    }

    #[tokio::test]
    async fn secondary_found_after_primary_error() {
        let work = sample_work("10.1/real", "A Real Paper", "Jane Doe", 2020);
        let (v, _, _) = verifier(
            StubSource::error("primary"),
            StubSource::found("secondary", work),
        );
        let result = v.verify(&doi_input("10.1/real")).await;
        assert!(result.exists);
        assert_eq!(result.source, SourceTag::Secondary);
        assert_eq!(result.status, CitationStatus::Verified);
    }

    #[tokio::test]
    async fn both_not_found_is_fake_likely() {
        let (v, _, _) = verifier(
            StubSource::not_found("primary"),
            StubSource::not_found("secondary"),
        );
        let result = v.verify(&doi_input("10.1/ghost")).await;
        assert!(!result.exists);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.status, CitationStatus::FakeLikely);
        assert_eq!(result.discrepancies.len(), 1);
        assert_eq!(result.discrepancies[0].field, Field::Doi);
        assert_eq!(result.discrepancies[0].severity, Severity::Critical);
    }

    #[tokio::test]
    async fn not_found_plus_error_is_fake_likely() {
        let (v, _, _) = verifier(
            StubSource::not_found("primary"),
            StubSource::error("secondary"),
        );
        let result = v.verify(&doi_input("10.1/ghost")).await;
        assert_eq!(result.status, CitationStatus::FakeLikely);
    }

    #[tokio::test]
    async fn error_plus_not_found_is_fake_likely() {
        let (v, _, _) = verifier(
            StubSource::error("primary"),
            StubSource::not_found("secondary"),
        );
        let result = v.verify(&doi_input("10.1/ghost")).await;
        assert_eq!(result.status, CitationStatus::FakeLikely);
    }

    #[tokio::test]
    async fn both_errors_skip_never_fake() {
        let (v, _, _) = verifier(StubSource::error("primary"), StubSource::error("secondary"));
        let result = v.verify(&doi_input("10.1/flaky")).await;
        assert_eq!(result.status, CitationStatus::Skip);
        assert!(result.discrepancies.is_empty());
        assert!(!result.exists);
    }

    #[tokio::test]
    async fn doi_confirmed_discrepancies_never_downgrade() {
        // Found work whose metadata disagrees with the citation on every
        // field: still verified, discrepancies attached for display.
        let work = sample_work("10.1/real", "Completely Different Subject", "Robert Smith", 1999);
        let (v, _, _) = verifier(
            StubSource::found("primary", work),
            StubSource::not_found("secondary"),
        );
        let input = CitationInput {
            doi: Some("10.1/real".to_string()),
            title: Some("Deep Learning Networks".to_string()),
            authors: vec!["Jane Doe".to_string()],
            year: Some(2020),
            ..Default::default()
        };
        let result = v.verify(&input).await;
        assert_eq!(result.status, CitationStatus::Verified);
        assert_eq!(result.confidence, 1.0);
        assert!(!result.discrepancies.is_empty());
    }

    #[tokio::test]
    async fn doi_confirmed_retraction_overrides() {
        let mut work = sample_work("10.1/bad", "Withdrawn Paper", "Jane Doe", 2018);
        work.updates.push(WorkUpdate {
            kind: "retraction".to_string(),
            label: None,
            date: Some("2020-01-02".to_string()),
            notice_url: None,
        });
        let (v, _, _) = verifier(
            StubSource::found("primary", work),
            StubSource::not_found("secondary"),
        );
        let result = v.verify(&doi_input("10.1/bad")).await;
        assert_eq!(result.status, CitationStatus::Retracted);
        assert!(result.exists);
        assert!(result.retraction.is_some());
    }

    #[tokio::test]
    async fn doi_org_url_takes_doi_path() {
        let work = sample_work("10.1/real", "A Real Paper", "Jane Doe", 2020);
        let (v, primary, _) = verifier(
            StubSource::found("primary", work),
            StubSource::not_found("secondary"),
        );
        let input = CitationInput {
            url: Some("https://doi.org/10.1/real.".to_string()),
            ..Default::default()
        };
        let result = v.verify(&input).await;
        assert_eq!(result.status, CitationStatus::Verified);
        assert_eq!(primary.get_calls(), 1);
        assert_eq!(primary.search_calls(), 0);
    }

    #[tokio::test]
    async fn empty_input_skips_without_lookups() {
        let (v, primary, secondary) = verifier(
            StubSource::not_found("primary"),
            StubSource::not_found("secondary"),
        );
        let result = v.verify(&CitationInput::default()).await;
        assert_eq!(result.status, CitationStatus::Skip);
        assert_eq!(primary.get_calls() + secondary.get_calls(), 0);
        assert_eq!(primary.search_calls() + secondary.search_calls(), 0);
    }

    #[tokio::test]
    async fn fuzzy_strong_match_verifies() {
        // Scenario: no DOI, search returns the cited work with near-exact
        // metadata. Match score 0.5 + 0.3 + 0.2 = 1.0.
        let candidate = sample_work("10.2/found", "Deep Learning for X", "Jane Doe", 2020);
        let (v, _, secondary) = verifier(
            StubSource::searching("primary", vec![candidate]),
            StubSource::not_found("secondary"),
        );
        let input = CitationInput {
            title: Some("Deep Learning for X".to_string()),
            authors: vec!["Jane Doe".to_string()],
            year: Some(2020),
            ..Default::default()
        };
        let result = v.verify(&input).await;
        assert_eq!(result.status, CitationStatus::Verified);
        assert!(result.exists);
        assert!(result.confidence >= 0.8);
        assert_eq!(result.source, SourceTag::Primary);
        assert_eq!(secondary.search_calls(), 0);
    }

    #[tokio::test]
    async fn fuzzy_dissimilar_best_hit_is_fake_likely() {
        // Scenario: the best thing the search can surface is nothing like
        // the citation — critical title discrepancy, fake-likely.
        let candidate = sample_work("10.2/other", "Medieval Poetry Archives", "Bob Roe", 1988);
        let (v, _, _) = verifier(
            StubSource::searching("primary", vec![candidate]),
            StubSource::not_found("secondary"),
        );
        let input = CitationInput {
            title: Some("Deep Learning for X".to_string()),
            authors: vec!["Jane Doe".to_string()],
            year: Some(2020),
            ..Default::default()
        };
        let result = v.verify(&input).await;
        assert_eq!(result.status, CitationStatus::FakeLikely);
        assert!(!result.exists);
        assert!(
            result
                .discrepancies
                .iter()
                .any(|d| d.field == Field::Title && d.severity == Severity::Critical)
        );
    }

    #[tokio::test]
    async fn fuzzy_no_candidates_skips() {
        let (v, _, secondary) = verifier(
            StubSource::searching("primary", Vec::new()),
            StubSource::searching("secondary", Vec::new()),
        );
        let input = CitationInput {
            title: Some("An Unindexed Manuscript".to_string()),
            ..Default::default()
        };
        let result = v.verify(&input).await;
        assert_eq!(result.status, CitationStatus::Skip);
        // Empty primary search falls back to the secondary search
        assert_eq!(secondary.search_calls(), 1);
    }

    #[tokio::test]
    async fn fuzzy_secondary_candidates_tagged_secondary() {
        let candidate = sample_work("10.2/found", "Deep Learning for X", "Jane Doe", 2020);
        let (v, _, _) = verifier(
            StubSource::searching("primary", Vec::new()),
            StubSource::searching("secondary", vec![candidate]),
        );
        let input = CitationInput {
            title: Some("Deep Learning for X".to_string()),
            authors: vec!["Jane Doe".to_string()],
            year: Some(2020),
            ..Default::default()
        };
        let result = v.verify(&input).await;
        assert_eq!(result.status, CitationStatus::Verified);
        assert_eq!(result.source, SourceTag::Secondary);
    }

    #[tokio::test]
    async fn fuzzy_retracted_match_reports_retracted() {
        let mut candidate = sample_work("10.2/found", "Deep Learning for X", "Jane Doe", 2020);
        candidate.updates.push(WorkUpdate {
            kind: "retraction".to_string(),
            label: None,
            date: None,
            notice_url: None,
        });
        let (v, _, _) = verifier(
            StubSource::searching("primary", vec![candidate]),
            StubSource::not_found("secondary"),
        );
        let input = CitationInput {
            title: Some("Deep Learning for X".to_string()),
            authors: vec!["Jane Doe".to_string()],
            year: Some(2020),
            ..Default::default()
        };
        let result = v.verify(&input).await;
        assert_eq!(result.status, CitationStatus::Retracted);
    }

    #[tokio::test]
    async fn idempotent_for_identical_input() {
        let work = sample_work("10.1/real", "A Real Paper", "Jane Doe", 2020);
        let (v, _, _) = verifier(
            StubSource::found("primary", work),
            StubSource::not_found("secondary"),
        );
        let input = doi_input("10.1/real");
        let first = v.verify(&input).await;
        let second = v.verify(&input).await;
        assert_eq!(first.status, second.status);
        assert_eq!(first.exists, second.exists);
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.discrepancies, second.discrepancies);
    }
}
