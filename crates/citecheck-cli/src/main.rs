use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use citecheck_core::{
    BatchCoordinator, BatchStats, CitationInput, CitationStatus, Config, ProgressEvent, Verifier,
};
use citecheck_reporting::{ScanContext, ScanItem, ScanVerdict, export_json};

/// Citation Checker - Verify scholarly citations against bibliographic sources
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to a JSON file of citations to check (reads stdin if omitted)
    input: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Contact email for the sources' polite pools (or CITECHECK_MAILTO)
    #[arg(long)]
    mailto: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Number of concurrent in-flight lookups (1-10)
    #[arg(long, default_value_t = 6)]
    concurrency: usize,

    /// Path to write results as JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let color = !args.no_color;

    let items = read_items(args.input.as_deref())?;
    if items.is_empty() {
        println!("no citations to check");
        return Ok(());
    }

    let config = Config {
        contact_email: args.mailto.or_else(|| std::env::var("CITECHECK_MAILTO").ok()),
        timeout: Duration::from_secs(args.timeout_secs),
        max_concurrent: args.concurrency,
        ..Config::default()
    };
    let verifier = Verifier::new(&config).context("failed to construct source clients")?;
    let coordinator = BatchCoordinator::new(verifier, &config);

    // Ctrl-C cancels in-flight work; pending citations come back as skips.
    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let bar = ProgressBar::new(items.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .expect("valid progress template"),
    );

    let inputs: Vec<CitationInput> = items.iter().map(|item| item.citation.clone()).collect();
    let bar_for_events = bar.clone();
    let results = coordinator
        .check_batch_with_progress(&inputs, move |event| {
            if let ProgressEvent::Result { .. } = event {
                bar_for_events.inc(1);
            }
        })
        .await;
    bar.finish_and_clear();

    let verdicts: Vec<ScanVerdict> = items
        .iter()
        .zip(results.iter())
        .map(|(item, result)| ScanVerdict {
            id: item.id.clone(),
            result: result.clone(),
        })
        .collect();

    for verdict in &verdicts {
        print_verdict(verdict, color);
    }
    print_summary(&BatchStats::from_results(&results));

    if let Some(path) = &args.output {
        let mut file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        export_json(&mut file, &verdicts)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(())
}

/// Read scan items from a file or stdin. Accepts either tagged ScanItem
/// records or bare CitationInput records (ids are generated positionally).
fn read_items(path: Option<&std::path::Path>) -> anyhow::Result<Vec<ScanItem>> {
    let mut raw = String::new();
    match path {
        Some(path) => {
            File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?
                .read_to_string(&mut raw)?;
        }
        None => {
            std::io::stdin().read_to_string(&mut raw)?;
        }
    }

    if let Ok(items) = serde_json::from_str::<Vec<ScanItem>>(&raw) {
        return Ok(items);
    }
    let citations: Vec<CitationInput> =
        serde_json::from_str(&raw).context("input is neither a scan-item nor a citation array")?;
    Ok(citations
        .into_iter()
        .enumerate()
        .map(|(i, citation)| ScanItem {
            id: format!("citation-{i}"),
            context: ScanContext::Reference,
            citation,
        })
        .collect())
}

fn status_label(status: CitationStatus, color: bool) -> String {
    let plain = match status {
        CitationStatus::Verified => "VERIFIED",
        CitationStatus::Retracted => "RETRACTED",
        CitationStatus::Concern => "CONCERN",
        CitationStatus::Correction => "CORRECTION",
        CitationStatus::FakeLikely => "LIKELY FAKE",
        CitationStatus::FakeProbably => "PROBABLY FAKE",
        CitationStatus::Skip => "SKIPPED",
    };
    if !color {
        return plain.to_string();
    }
    match status {
        CitationStatus::Verified => plain.green().to_string(),
        CitationStatus::Retracted => plain.red().bold().to_string(),
        CitationStatus::Concern | CitationStatus::Correction => plain.yellow().to_string(),
        CitationStatus::FakeLikely | CitationStatus::FakeProbably => plain.red().to_string(),
        CitationStatus::Skip => plain.dimmed().to_string(),
    }
}

fn print_verdict(verdict: &ScanVerdict, color: bool) {
    let result = &verdict.result;
    let label = status_label(result.status, color);
    let title = result
        .work
        .as_ref()
        .map(|w| w.title.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or("(no matched work)");
    println!("[{label}] {}: {title}", verdict.id);
    for discrepancy in &result.discrepancies {
        println!(
            "    {:?} {:?}: cited {:?}, found {:?}",
            discrepancy.severity, discrepancy.field, discrepancy.provided, discrepancy.actual
        );
    }
    if let Some(signal) = &result.retraction {
        let date = signal.date.as_deref().unwrap_or("date unknown");
        println!("    {:?} notice ({date})", signal.nature);
    }
}

fn print_summary(stats: &BatchStats) {
    println!();
    println!(
        "{} checked: {} verified, {} retracted/concern/correction, {} flagged, {} skipped",
        stats.total,
        stats.verified,
        stats.retracted + stats.concern + stats.correction,
        stats.flagged(),
        stats.skipped
    );
}
