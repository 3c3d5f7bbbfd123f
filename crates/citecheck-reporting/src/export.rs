//! Result export for downstream tooling.

use std::io::{self, Write};

use citecheck_core::{BatchStats, CitationStatus};

use crate::types::{ExportFormat, ScanVerdict};

/// Write verdicts in the requested format.
pub fn export_results<W: Write>(
    writer: &mut W,
    verdicts: &[ScanVerdict],
    format: ExportFormat,
) -> io::Result<()> {
    match format {
        ExportFormat::Json => export_json(writer, verdicts),
        ExportFormat::Text => export_text(writer, verdicts),
    }
}

/// Write verdicts as a pretty-printed JSON array.
pub fn export_json<W: Write>(writer: &mut W, verdicts: &[ScanVerdict]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, verdicts)?;
    writeln!(writer)
}

fn export_text<W: Write>(writer: &mut W, verdicts: &[ScanVerdict]) -> io::Result<()> {
    for verdict in verdicts {
        let result = &verdict.result;
        write!(
            writer,
            "{}\t{}\tconfidence {:.2}",
            verdict.id,
            status_label(result.status),
            result.confidence
        )?;
        if !result.discrepancies.is_empty() {
            write!(writer, "\t{} discrepancies", result.discrepancies.len())?;
        }
        writeln!(writer)?;
    }

    let results: Vec<_> = verdicts.iter().map(|v| v.result.clone()).collect();
    let stats = BatchStats::from_results(&results);
    writeln!(
        writer,
        "total {} / verified {} / retracted {} / flagged {} / skipped {}",
        stats.total,
        stats.verified,
        stats.retracted + stats.concern + stats.correction,
        stats.flagged(),
        stats.skipped
    )
}

fn status_label(status: CitationStatus) -> &'static str {
    match status {
        CitationStatus::Verified => "verified",
        CitationStatus::Retracted => "RETRACTED",
        CitationStatus::Concern => "expression of concern",
        CitationStatus::Correction => "correction",
        CitationStatus::FakeLikely => "LIKELY FAKE",
        CitationStatus::FakeProbably => "PROBABLY FAKE",
        CitationStatus::Skip => "skipped",
    }
}
