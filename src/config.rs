//! Preview cache configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Knobs exposed to the embedder: where entries live and how long a fresh
/// entry stays valid.
#[derive(Debug, Clone)]
pub struct PreviewCacheConfig {
    /// Directory holding the cache entries. Created on open if missing.
    pub cache_dir: PathBuf,
    /// Time-to-live for freshly fetched entries.
    pub ttl: Duration,
}

impl Default for PreviewCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("Temp"),
            ttl: Duration::from_secs(3600),
        }
    }
}

impl PreviewCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Set the time-to-live for fresh entries.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PreviewCacheConfig::default();
        assert_eq!(config.cache_dir, PathBuf::from("Temp"));
        assert_eq!(config.ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_config_builder() {
        let config = PreviewCacheConfig::new()
            .with_cache_dir("/tmp/previews")
            .with_ttl(Duration::from_millis(1000));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/previews"));
        assert_eq!(config.ttl, Duration::from_millis(1000));
    }
}
