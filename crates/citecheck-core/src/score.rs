//! Confidence scoring over a discrepancy set.
//!
//! A simple additive penalty model, documented as a heuristic: it is not a
//! calibrated probability, just a monotone summary of how badly the
//! provided metadata diverges from the retrieved work.

use crate::{Discrepancy, Severity};

const CRITICAL_PENALTY: f64 = 0.5;
const MAJOR_PENALTY: f64 = 0.2;
const MINOR_PENALTY: f64 = 0.05;

/// Reduce discrepancies to a scalar confidence in [0, 1].
///
/// Starts at 1.0 and subtracts 0.5 per critical, 0.2 per major, and 0.05
/// per minor discrepancy, clamped to [0, 1].
pub fn confidence(discrepancies: &[Discrepancy]) -> f64 {
    let penalty: f64 = discrepancies
        .iter()
        .map(|d| match d.severity {
            Severity::Critical => CRITICAL_PENALTY,
            Severity::Major => MAJOR_PENALTY,
            Severity::Minor => MINOR_PENALTY,
        })
        .sum();
    (1.0 - penalty).clamp(0.0, 1.0)
}
