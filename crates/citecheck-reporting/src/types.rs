//! Data shapes exchanged with the scanning and presentation collaborators.
//!
//! The scanner supplies [`ScanItem`] records (a citation plus an opaque id
//! and context tag) and receives a [`ScanVerdict`] per id. Presentation
//! consumers that predate [`VerificationResult`] receive the legacy shape
//! ([`LegacyResult`]) instead; both serialize with the field names those
//! consumers already rely on.

use citecheck_core::{CitationInput, SignalNature, VerificationResult};
use serde::{Deserialize, Serialize};

/// Where on the page the scanner found the citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanContext {
    CurrentArticle,
    Reference,
}

/// One citation to verify, tagged by the scanning collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanItem {
    /// Caller-assigned opaque id; echoed back on the verdict.
    pub id: String,
    pub context: ScanContext,
    #[serde(flatten)]
    pub citation: CitationInput,
}

/// The engine's answer for one scanned citation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanVerdict {
    pub id: String,
    #[serde(flatten)]
    pub result: VerificationResult,
}

/// Retraction details in the legacy presentation shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetractionDetails {
    pub nature: String,
    pub date: Option<String>,
    pub reasons: Vec<String>,
    pub notice_url: Option<String>,
}

/// Metadata validation summary in the legacy presentation shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyValidation {
    pub exists: bool,
    pub confidence: f64,
    pub status: citecheck_core::CitationStatus,
    pub discrepancy_count: usize,
}

/// The legacy result shape older presentation consumers expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyResult {
    pub is_retracted: bool,
    pub retraction_details: Option<RetractionDetails>,
    pub validation: Option<LegacyValidation>,
}

impl From<&VerificationResult> for LegacyResult {
    fn from(result: &VerificationResult) -> Self {
        let retraction_details = result.retraction.as_ref().map(|signal| RetractionDetails {
            nature: match signal.nature {
                SignalNature::Retraction => "retraction".to_string(),
                SignalNature::ExpressionOfConcern => "expression-of-concern".to_string(),
                SignalNature::Correction => "correction".to_string(),
            },
            date: signal.date.clone(),
            reasons: signal.reasons.clone(),
            notice_url: signal.notice_url.clone(),
        });
        Self {
            is_retracted: matches!(
                signal_nature(result),
                Some(SignalNature::Retraction)
            ),
            retraction_details,
            validation: Some(LegacyValidation {
                exists: result.exists,
                confidence: result.confidence,
                status: result.status,
                discrepancy_count: result.discrepancies.len(),
            }),
        }
    }
}

fn signal_nature(result: &VerificationResult) -> Option<SignalNature> {
    result.retraction.as_ref().map(|s| s.nature)
}

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;
    use citecheck_core::{CitationStatus, RetractionSignal, SourceTag};

    fn verified_result() -> VerificationResult {
        VerificationResult {
            exists: true,
            confidence: 1.0,
            source: SourceTag::Primary,
            work: None,
            discrepancies: Vec::new(),
            retraction: None,
            status: CitationStatus::Verified,
        }
    }

    #[test]
    fn scan_item_round_trips_with_flattened_citation() {
        let json = serde_json::json!({
            "id": "ref-3",
            "context": "reference",
            "doi": "10.1/x",
            "title": "A Paper",
            "authors": ["Jane Doe"],
            "year": 2020
        });
        let item: ScanItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.id, "ref-3");
        assert_eq!(item.context, ScanContext::Reference);
        assert_eq!(item.citation.doi.as_deref(), Some("10.1/x"));
        assert_eq!(item.citation.year, Some(2020));
    }

    #[test]
    fn legacy_shape_uses_camel_case_field_names() {
        let mut result = verified_result();
        result.retraction = Some(RetractionSignal {
            nature: SignalNature::Retraction,
            date: Some("2022-05-17".to_string()),
            reasons: vec!["data fabrication".to_string()],
            notice_url: None,
        });
        result.status = CitationStatus::Retracted;

        let legacy = LegacyResult::from(&result);
        let value = serde_json::to_value(&legacy).unwrap();
        assert_eq!(value["isRetracted"], serde_json::json!(true));
        assert_eq!(
            value["retractionDetails"]["nature"],
            serde_json::json!("retraction")
        );
        assert_eq!(value["validation"]["status"], serde_json::json!("retracted"));
        assert_eq!(value["validation"]["discrepancyCount"], serde_json::json!(0));
    }

    #[test]
    fn concern_is_not_reported_as_retracted() {
        let mut result = verified_result();
        result.retraction = Some(RetractionSignal {
            nature: SignalNature::ExpressionOfConcern,
            date: None,
            reasons: Vec::new(),
            notice_url: None,
        });
        result.status = CitationStatus::Concern;
        let legacy = LegacyResult::from(&result);
        assert!(!legacy.is_retracted);
        assert!(legacy.retraction_details.is_some());
    }

    #[test]
    fn statuses_serialize_kebab_case() {
        assert_eq!(
            serde_json::to_value(CitationStatus::FakeLikely).unwrap(),
            serde_json::json!("fake-likely")
        );
        assert_eq!(
            serde_json::to_value(CitationStatus::Skip).unwrap(),
            serde_json::json!("skip")
        );
    }
}
