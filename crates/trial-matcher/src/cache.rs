//! Compiled-criterion caching for trial loading.
//!
//! Provides an LRU cache keyed by trimmed criterion text, so a criterion
//! shared by many trials and cohorts is compiled once. Thread-safe using
//! `Mutex` for LRU operations.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use lru::LruCache;
use trial_criteria::EligibilityFunction;

use crate::config::CacheConfig;

/// Thread-safe LRU cache of compiled criteria.
///
/// Only successful compilations are stored; a criterion that fails to
/// compile is compiled again every time it is met, so every occurrence is
/// reported.
///
/// # Example
///
/// ```rust
/// use trial_criteria::{EligibilityFunction, RuleId};
/// use trial_matcher::{CacheConfig, CriterionCache};
///
/// let cache = CriterionCache::new(CacheConfig::default());
/// let function = EligibilityFunction::leaf(RuleId::new("IS_MALE").unwrap(), vec![]);
///
/// cache.set("IS_MALE".to_string(), function.clone());
/// assert_eq!(cache.get("IS_MALE"), Some(function));
/// assert_eq!(cache.stats().hits, 1);
/// ```
pub struct CriterionCache {
    /// The LRU cache wrapped in a mutex for thread-safety.
    inner: Mutex<LruCache<String, EligibilityFunction>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CriterionCache {
    /// Creates a new criterion cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_capacity(config.max_entries)
    }

    /// Creates a cache holding at most `max_entries` criteria (at least one).
    pub fn with_capacity(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Gets a compiled criterion by key, promoting it to most-recently-used.
    pub fn get(&self, key: &str) -> Option<EligibilityFunction> {
        let found = self
            .inner
            .lock()
            .ok()
            .and_then(|mut cache| cache.get(key).cloned());

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Stores a compiled criterion, evicting the least recently used entry
    /// when full.
    pub fn set(&self, key: String, function: EligibilityFunction) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.put(key, function);
        }
    }

    /// Checks if a key exists in the cache (without affecting LRU order).
    pub fn contains(&self, key: &str) -> bool {
        match self.inner.lock() {
            Ok(cache) => cache.contains(key),
            _ => false,
        }
    }

    /// Returns the number of entries currently in the cache.
    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(cache) => cache.len(),
            _ => 0,
        }
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clears all entries and resets the hit/miss counters.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.clear();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for CriterionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("CriterionCache")
            .field("entries", &stats.entries)
            .field("hits", &stats.hits)
            .field("misses", &stats.misses)
            .finish()
    }
}

/// Statistics about the cache state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of compiled criteria held.
    pub entries: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that required compilation.
    pub misses: u64,
}

impl CacheStats {
    /// Fraction of lookups answered from the cache; zero before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Normalizes a criterion string for consistent cache keys.
///
/// Only the ends are trimmed. Inner whitespace is kept because string
/// parameters keep it too: `HAS_TUMOR_TYPE[SMALL  CELL]` and
/// `HAS_TUMOR_TYPE[SMALL CELL]` compile to different values. Case is kept:
/// rule names are case-sensitive.
///
/// # Example
///
/// ```rust
/// use trial_matcher::normalize_cache_key;
///
/// assert_eq!(normalize_cache_key("  NOT(IS_MALE)\n"), "NOT(IS_MALE)");
/// assert_ne!(normalize_cache_key("AND(A,  B)"), normalize_cache_key("AND(A, B)"));
/// ```
pub fn normalize_cache_key(criterion: &str) -> String {
    criterion.trim().to_string()
}
