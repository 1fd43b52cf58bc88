//! Configuration types for trial loading and matching.

/// Configuration for the trial loader and matcher.
///
/// # Example
///
/// ```rust
/// use trial_matcher::{CacheConfig, MatcherConfig};
///
/// let config = MatcherConfig::builder()
///     .with_cache(CacheConfig { max_entries: 5_000 })
///     .with_parallel(true)
///     .with_participation_check(false)
///     .build();
///
/// assert!(config.parallel);
/// ```
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Compiled-criterion cache used while loading (None = caching disabled).
    pub cache: Option<CacheConfig>,
    /// Match trials in parallel (requires `parallel` feature).
    pub parallel: bool,
    /// Add the previous-participation warning to every trial's general criteria.
    pub participation_check: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            cache: Some(CacheConfig::default()),
            parallel: false,
            participation_check: true,
        }
    }
}

impl MatcherConfig {
    /// Creates a new builder for MatcherConfig.
    pub fn builder() -> MatcherConfigBuilder {
        MatcherConfigBuilder::default()
    }
}

/// Builder for MatcherConfig.
#[derive(Debug, Clone)]
pub struct MatcherConfigBuilder {
    cache: Option<CacheConfig>,
    parallel: bool,
    participation_check: bool,
}

impl Default for MatcherConfigBuilder {
    fn default() -> Self {
        let config = MatcherConfig::default();
        Self {
            cache: config.cache,
            parallel: config.parallel,
            participation_check: config.participation_check,
        }
    }
}

impl MatcherConfigBuilder {
    /// Enables caching with the given configuration.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Disables the compiled-criterion cache.
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Enables or disables parallel matching.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enables or disables the previous-participation warning.
    pub fn with_participation_check(mut self, participation_check: bool) -> Self {
        self.participation_check = participation_check;
        self
    }

    /// Builds the MatcherConfig.
    pub fn build(self) -> MatcherConfig {
        MatcherConfig {
            cache: self.cache,
            parallel: self.parallel,
            participation_check: self.participation_check,
        }
    }
}

/// Configuration for the compiled-criterion cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of compiled criteria kept.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 10_000 }
    }
}
