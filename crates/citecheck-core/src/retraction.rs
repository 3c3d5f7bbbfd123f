//! Retraction signal detection over a found work's update markers.
//!
//! A pure function of the source payload; never issues network calls. The
//! first matching marker wins, in the order the source listed them.

use crate::{RetractionSignal, SignalNature, WorkRecord};

/// Inspect a found work's raw update/relation metadata for retraction-,
/// withdrawal-, or concern-type markers.
pub fn detect(work: &WorkRecord) -> Option<RetractionSignal> {
    work.updates.iter().find_map(|update| {
        let nature = classify_kind(&update.kind)?;
        Some(RetractionSignal {
            nature,
            date: update.date.clone(),
            reasons: update.label.iter().cloned().collect(),
            notice_url: update.notice_url.clone(),
        })
    })
}

fn classify_kind(kind: &str) -> Option<SignalNature> {
    let kind = kind.to_lowercase();
    if kind.contains("retract") || kind.contains("withdraw") || kind.contains("removal") {
        Some(SignalNature::Retraction)
    } else if kind.contains("concern") {
        Some(SignalNature::ExpressionOfConcern)
    } else if kind.contains("correction") || kind.contains("erratum") || kind.contains("corrigendum")
    {
        Some(SignalNature::Correction)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkUpdate;

    fn work_with(kinds: &[&str]) -> WorkRecord {
        WorkRecord {
            title: "Some Paper".to_string(),
            updates: kinds
                .iter()
                .map(|k| WorkUpdate {
                    kind: k.to_string(),
                    label: Some(format!("{k} notice")),
                    date: Some("2022-05-17".to_string()),
                    notice_url: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn clean_work_has_no_signal() {
        assert!(detect(&work_with(&[])).is_none());
        assert!(detect(&work_with(&["new_edition"])).is_none());
    }

    #[test]
    fn retraction_kinds() {
        for kind in ["retraction", "Retraction", "withdrawal", "removal"] {
            let signal = detect(&work_with(&[kind])).unwrap();
            assert_eq!(signal.nature, SignalNature::Retraction, "kind {kind:?}");
        }
    }

    #[test]
    fn concern_kind() {
        let signal = detect(&work_with(&["expression_of_concern"])).unwrap();
        assert_eq!(signal.nature, SignalNature::ExpressionOfConcern);
    }

    #[test]
    fn correction_kinds() {
        for kind in ["correction", "erratum", "corrigendum", "partial_retraction_correction"] {
            assert!(detect(&work_with(&[kind])).is_some(), "kind {kind:?}");
        }
    }

    #[test]
    fn first_matching_marker_wins() {
        let signal = detect(&work_with(&["new_edition", "correction", "retraction"])).unwrap();
        assert_eq!(signal.nature, SignalNature::Correction);
    }

    #[test]
    fn signal_carries_marker_details() {
        let signal = detect(&work_with(&["retraction"])).unwrap();
        assert_eq!(signal.date.as_deref(), Some("2022-05-17"));
        assert_eq!(signal.reasons, vec!["retraction notice".to_string()]);
    }
}
