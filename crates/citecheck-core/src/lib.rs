use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod batch;
pub mod cache;
pub mod classify;
pub mod compare;
pub mod ident;
pub mod matching;
pub mod retraction;
pub mod score;
pub mod sources;
pub mod verify;

#[cfg(test)]
pub(crate) mod testutil;

pub use batch::{BatchCoordinator, BatchStats, ProgressEvent};
pub use cache::ResultCache;
pub use sources::{LookupOutcome, SourceClient};
pub use verify::Verifier;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// A citation as provided by the caller (typically extracted from a page).
///
/// No field is individually required; at least one identifying field (DOI,
/// PMID, URL, or title) must be present for a meaningful result. An input
/// with none of them verifies to [`CitationStatus::Skip`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationInput {
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub journal: Option<String>,
}

/// One author of a retrieved work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkAuthor {
    pub given: Option<String>,
    pub family: Option<String>,
    pub display_name: String,
}

impl WorkAuthor {
    /// Build an author from given/family parts, composing the display name
    /// when the source did not supply one.
    pub fn from_parts(
        given: Option<String>,
        family: Option<String>,
        display_name: Option<String>,
    ) -> Self {
        let display_name = display_name.unwrap_or_else(|| {
            match (given.as_deref(), family.as_deref()) {
                (Some(g), Some(f)) => format!("{g} {f}"),
                (Some(g), None) => g.to_string(),
                (None, Some(f)) => f.to_string(),
                (None, None) => String::new(),
            }
        });
        Self {
            given,
            family,
            display_name,
        }
    }
}

/// A raw update/relation marker attached to a work by its source
/// (retraction notices, expressions of concern, errata, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUpdate {
    /// Source-side marker type, e.g. `retraction` or `expression_of_concern`.
    pub kind: String,
    pub label: Option<String>,
    pub date: Option<String>,
    pub notice_url: Option<String>,
}

/// Bibliographic metadata for a work, as retrieved from one source.
///
/// Produced only by a [`SourceClient`] on a successful lookup; immutable
/// once constructed. `year == 0` means the source did not report one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkRecord {
    pub doi: String,
    pub title: String,
    pub authors: Vec<WorkAuthor>,
    pub year: i32,
    pub journal: Option<String>,
    pub publisher: Option<String>,
    pub work_type: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub pages: Option<String>,
    /// Raw retraction/correction markers, inspected by [`retraction::detect`].
    pub updates: Vec<WorkUpdate>,
}

/// Which citation field a discrepancy was detected on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Year,
    Authors,
    Journal,
    Doi,
    Url,
}

/// Discrepancy severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

/// A detected mismatch between provided and retrieved metadata.
///
/// Severity is determined by the per-field comparison rules in
/// [`compare`], never assigned arbitrarily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub field: Field,
    pub provided: String,
    pub actual: String,
    pub severity: Severity,
}

/// The nature of a retraction-type signal on a found work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalNature {
    Retraction,
    ExpressionOfConcern,
    Correction,
}

/// A retraction/concern/correction marker extracted from a found work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetractionSignal {
    pub nature: SignalNature,
    pub date: Option<String>,
    pub reasons: Vec<String>,
    pub notice_url: Option<String>,
}

/// Which source produced the evidence behind a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Primary,
    Secondary,
    None,
}

/// Final status assigned to a citation.
///
/// `Skip` means "no usable evidence either way" and must never be rendered
/// as an accusation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CitationStatus {
    Verified,
    Retracted,
    Concern,
    Correction,
    FakeLikely,
    FakeProbably,
    Skip,
}

impl CitationStatus {
    /// Whether this status accuses the citation of being fabricated.
    pub fn is_accusation(self) -> bool {
        matches!(self, CitationStatus::FakeLikely | CitationStatus::FakeProbably)
    }
}

/// The outcome of verifying a single citation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub exists: bool,
    /// Heuristic match confidence in [0, 1]; not a calibrated probability.
    pub confidence: f64,
    pub source: SourceTag,
    pub work: Option<WorkRecord>,
    pub discrepancies: Vec<Discrepancy>,
    pub retraction: Option<RetractionSignal>,
    pub status: CitationStatus,
}

impl VerificationResult {
    /// The "no usable evidence" result: never an accusation.
    pub fn skip() -> Self {
        Self {
            exists: false,
            confidence: 0.0,
            source: SourceTag::None,
            work: None,
            discrepancies: Vec::new(),
            retraction: None,
            status: CitationStatus::Skip,
        }
    }
}

/// Configuration for the verification engine.
///
/// Source clients are constructed from this; there are no ambient globals.
#[derive(Debug, Clone)]
pub struct Config {
    /// Contact email sent to both sources per their polite-pool convention.
    pub contact_email: Option<String>,
    pub crossref_base: String,
    pub openalex_base: String,
    /// Per-request timeout at the source client boundary. A timeout
    /// surfaces as [`LookupOutcome::Error`], never as not-found.
    pub timeout: Duration,
    /// Bound on concurrent in-flight lookups in a batch (clamped to 1..=10).
    pub max_concurrent: usize,
    /// Cache TTL for results confirming existence.
    pub positive_ttl: Duration,
    /// Cache TTL for results confirming absence.
    pub negative_ttl: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            contact_email: None,
            crossref_base: "https://api.crossref.org".to_string(),
            openalex_base: "https://api.openalex.org".to_string(),
            timeout: Duration::from_secs(10),
            max_concurrent: 6,
            positive_ttl: Duration::from_secs(24 * 60 * 60),
            negative_ttl: Duration::from_secs(6 * 60 * 60),
        }
    }
}

impl CitationInput {
    /// Whether any identifying field is present.
    pub fn is_identifiable(&self) -> bool {
        self.doi.is_some()
            || self.pmid.is_some()
            || self.url.is_some()
            || self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}
