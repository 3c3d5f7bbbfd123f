//! In-memory cache for verification results.
//!
//! Avoids redundant source lookups when the same citation is verified
//! multiple times (e.g. across pages that share references).
//!
//! Keys are built from the first non-empty identifying field, in priority
//! order: normalized DOI, then normalized PMID, then normalized title.
//! Only evidence-bearing results are cached; skips caused by transient
//! source failure are never cached.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::matching::normalize_title;
use crate::{CitationInput, CitationStatus, VerificationResult, ident};

/// Default time-to-live for results confirming existence.
const DEFAULT_POSITIVE_TTL: Duration = Duration::from_secs(24 * 60 * 60); // 24 hours

/// Default time-to-live for results confirming absence.
const DEFAULT_NEGATIVE_TTL: Duration = Duration::from_secs(6 * 60 * 60); // 6 hours

/// Cache key: the strongest normalized identifier the citation carries.
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key from a citation, or `None` if nothing identifies it.
    pub fn for_input(input: &CitationInput) -> Option<Self> {
        if let Some(doi) = input
            .doi
            .as_deref()
            .and_then(ident::normalize_doi_from_text)
            .or_else(|| input.url.as_deref().and_then(ident::doi_from_url))
        {
            return Some(Self(format!("doi:{doi}")));
        }
        if let Some(pmid) = input.pmid.as_deref().and_then(ident::normalize_pmid) {
            return Some(Self(format!("pmid:{pmid}")));
        }
        let title = normalize_title(input.title.as_deref()?);
        if title.is_empty() {
            return None;
        }
        Some(Self(format!("title:{title}")))
    }
}

/// A timestamped cache entry.
#[derive(Clone, Debug)]
struct CacheEntry {
    result: VerificationResult,
    inserted_at: Instant,
}

/// Thread-safe in-memory cache keyed by normalized citation identifier.
///
/// Uses [`DashMap`] for lock-free concurrent access from the batch
/// coordinator's worker tasks.
pub struct ResultCache {
    entries: DashMap<CacheKey, CacheEntry>,
    positive_ttl: Duration,
    negative_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_POSITIVE_TTL, DEFAULT_NEGATIVE_TTL)
    }
}

impl ResultCache {
    /// Create a cache with custom TTLs.
    pub fn new(positive_ttl: Duration, negative_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            positive_ttl,
            negative_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a cached result for the given key.
    ///
    /// Returns `Some(result)` on a hit within TTL, `None` on a miss.
    pub fn get(&self, key: &CacheKey) -> Option<VerificationResult> {
        let entry = match self.entries.get(key) {
            Some(e) => e,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };
        let ttl = if entry.result.exists {
            self.positive_ttl
        } else {
            self.negative_ttl
        };

        if entry.inserted_at.elapsed() > ttl {
            // Expired — remove and treat as miss
            drop(entry);
            self.entries.remove(key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.result.clone())
    }

    /// Insert a verification result.
    ///
    /// Skip results are not cached: a skip only says no evidence was
    /// available this time, and transient failures must not be replayed.
    pub fn insert(&self, key: CacheKey, result: &VerificationResult) {
        if result.status == CitationStatus::Skip {
            return;
        }
        self.entries.insert(
            key,
            CacheEntry {
                result: result.clone(),
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop all entries (external invalidation).
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of cache hits since creation.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of cache misses since creation.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of entries currently in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.entries.len())
            .field("hits", &self.hits())
            .field("misses", &self.misses())
            .field("positive_ttl", &self.positive_ttl)
            .field("negative_ttl", &self.negative_ttl)
            .finish()
    }
}
