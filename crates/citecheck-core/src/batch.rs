//! Batch verification with shared worker tasks and a result cache.
//!
//! A single mpmc work queue feeds a bounded set of workers, so the number
//! of in-flight lookups never exceeds the configured window regardless of
//! batch size. Results are returned index-aligned with the inputs: a job
//! whose worker dies or is cancelled degrades to a skip for that input
//! only, never corrupting sibling results.

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheKey, ResultCache};
use crate::{CitationInput, CitationStatus, Config, VerificationResult, Verifier};

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone, Copy)]
pub enum ProgressEvent {
    Checking {
        index: usize,
        total: usize,
    },
    Result {
        index: usize,
        total: usize,
        status: CitationStatus,
    },
}

/// Summary statistics for a completed batch.
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    pub total: usize,
    pub verified: usize,
    pub retracted: usize,
    pub concern: usize,
    pub correction: usize,
    pub fake_likely: usize,
    pub fake_probably: usize,
    pub skipped: usize,
}

impl BatchStats {
    pub fn from_results(results: &[VerificationResult]) -> Self {
        let mut stats = Self {
            total: results.len(),
            ..Self::default()
        };
        for result in results {
            match result.status {
                CitationStatus::Verified => stats.verified += 1,
                CitationStatus::Retracted => stats.retracted += 1,
                CitationStatus::Concern => stats.concern += 1,
                CitationStatus::Correction => stats.correction += 1,
                CitationStatus::FakeLikely => stats.fake_likely += 1,
                CitationStatus::FakeProbably => stats.fake_probably += 1,
                CitationStatus::Skip => stats.skipped += 1,
            }
        }
        stats
    }

    /// Citations flagged as likely or probably fabricated.
    pub fn flagged(&self) -> usize {
        self.fake_likely + self.fake_probably
    }
}

/// A verification job submitted to the worker pool.
struct VerifyJob {
    index: usize,
    total: usize,
    input: CitationInput,
    result_tx: oneshot::Sender<VerificationResult>,
}

/// Fans out many verification requests over a bounded worker pool, with a
/// process-lifetime result cache shared across batches.
pub struct BatchCoordinator {
    verifier: Arc<Verifier>,
    cache: Arc<ResultCache>,
    workers: usize,
    cancel: CancellationToken,
}

impl BatchCoordinator {
    pub fn new(verifier: Verifier, config: &Config) -> Self {
        Self {
            verifier: Arc::new(verifier),
            cache: Arc::new(ResultCache::new(config.positive_ttl, config.negative_ttl)),
            workers: config.max_concurrent.clamp(1, 10),
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels in-flight and queued work when triggered.
    /// Cancelled inputs yield skip results; the output stays index-aligned.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Verify a batch of citations; `result[i]` answers `inputs[i]`.
    pub async fn check_batch(&self, inputs: &[CitationInput]) -> Vec<VerificationResult> {
        self.check_batch_with_progress(inputs, |_| {}).await
    }

    /// As [`check_batch`](Self::check_batch), emitting progress events via
    /// the callback as jobs start and finish.
    pub async fn check_batch_with_progress(
        &self,
        inputs: &[CitationInput],
        progress: impl Fn(ProgressEvent) + Send + Sync + 'static,
    ) -> Vec<VerificationResult> {
        let total = inputs.len();
        let progress: Arc<dyn Fn(ProgressEvent) + Send + Sync> = Arc::new(progress);
        let (job_tx, job_rx) = async_channel::unbounded::<VerifyJob>();

        let mut result_rxs = Vec::with_capacity(total);
        for (index, input) in inputs.iter().cloned().enumerate() {
            let (result_tx, result_rx) = oneshot::channel();
            result_rxs.push(result_rx);
            let _ = job_tx
                .send(VerifyJob {
                    index,
                    total,
                    input,
                    result_tx,
                })
                .await;
        }
        job_tx.close();

        let mut handles: Vec<JoinHandle<()>> = Vec::with_capacity(self.workers);
        for _ in 0..self.workers {
            let job_rx = job_rx.clone();
            let verifier = self.verifier.clone();
            let cache = self.cache.clone();
            let cancel = self.cancel.clone();
            let progress = progress.clone();
            handles.push(tokio::spawn(worker_loop(
                job_rx, verifier, cache, cancel, progress,
            )));
        }
        drop(job_rx);

        // A dropped sender (worker exit, cancellation) becomes a skip for
        // that input only.
        let mut results = Vec::with_capacity(total);
        for result_rx in result_rxs {
            results.push(result_rx.await.unwrap_or_else(|_| VerificationResult::skip()));
        }
        for handle in handles {
            let _ = handle.await;
        }
        results
    }
}

/// Worker loop: receive jobs, consult the cache, verify, send results.
async fn worker_loop(
    job_rx: async_channel::Receiver<VerifyJob>,
    verifier: Arc<Verifier>,
    cache: Arc<ResultCache>,
    cancel: CancellationToken,
    progress: Arc<dyn Fn(ProgressEvent) + Send + Sync>,
) {
    while let Ok(job) = job_rx.recv().await {
        if cancel.is_cancelled() {
            break;
        }
        let VerifyJob {
            index,
            total,
            input,
            result_tx,
        } = job;

        progress(ProgressEvent::Checking { index, total });

        let key = CacheKey::for_input(&input);
        let result = match key.as_ref().and_then(|k| cache.get(k)) {
            Some(cached) => cached,
            None => {
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    result = verifier.verify(&input) => result,
                };
                if let Some(key) = key {
                    cache.insert(key, &result);
                }
                result
            }
        };

        progress(ProgressEvent::Result {
            index,
            total,
            status: result.status,
        });
        let _ = result_tx.send(result);
    }
}
