//! Scripted source clients for orchestrator and batch tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::sources::{LookupOutcome, SourceClient};
use crate::{WorkAuthor, WorkRecord};

/// A source client that replays a fixed outcome and search result set,
/// counting calls so tests can assert sequencing and short-circuiting.
pub(crate) struct StubSource {
    pub name: &'static str,
    pub outcome: LookupOutcome,
    pub results: Vec<WorkRecord>,
    pub get_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
}

impl StubSource {
    pub fn new(name: &'static str, outcome: LookupOutcome) -> Self {
        Self {
            name,
            outcome,
            results: Vec::new(),
            get_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
        }
    }

    pub fn found(name: &'static str, work: WorkRecord) -> Self {
        Self::new(name, LookupOutcome::Found(work))
    }

    pub fn not_found(name: &'static str) -> Self {
        Self::new(name, LookupOutcome::NotFound)
    }

    pub fn error(name: &'static str) -> Self {
        Self::new(name, LookupOutcome::Error(format!("{name}: connection reset")))
    }

    pub fn searching(name: &'static str, results: Vec<WorkRecord>) -> Self {
        Self {
            results,
            ..Self::new(name, LookupOutcome::NotFound)
        }
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceClient for StubSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn get_work(&self, _doi: &str) -> LookupOutcome {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }

    async fn search(
        &self,
        _title: &str,
        _first_author: Option<&str>,
        _year: Option<i32>,
    ) -> Vec<WorkRecord> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.results.clone()
    }
}

/// A plain journal article record for tests.
pub(crate) fn sample_work(doi: &str, title: &str, author: &str, year: i32) -> WorkRecord {
    WorkRecord {
        doi: doi.to_string(),
        title: title.to_string(),
        authors: vec![WorkAuthor::from_parts(None, None, Some(author.to_string()))],
        year,
        journal: Some("Journal of Examples".to_string()),
        ..Default::default()
    }
}
