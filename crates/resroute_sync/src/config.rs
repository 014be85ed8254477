//! Configuration for the sync orchestrator.

use std::time::Duration;

/// Default path of the remote listing, appended to the endpoint.
pub const DEFAULT_LISTING_PATH: &str = "/listing.json";

/// Configuration for sync passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Remote endpoint (scheme and host, no trailing slash).
    pub endpoint: String,
    /// Path of the listing document under the endpoint.
    pub listing_path: String,
    /// API key sent as `X-Api-Key` when set.
    pub api_key: Option<String>,
    /// Bound on how long one pass waits for both fetches.
    pub timeout: Duration,
    /// Number of runtime worker threads.
    pub worker_threads: usize,
}

impl SyncConfig {
    /// Creates a configuration for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            listing_path: DEFAULT_LISTING_PATH.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            worker_threads: 2,
        }
    }

    /// Sets the listing path.
    pub fn with_listing_path(mut self, path: impl Into<String>) -> Self {
        self.listing_path = path.into();
        self
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the pass timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the worker thread count (at least one).
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    /// Returns the full listing URL.
    pub fn listing_url(&self) -> String {
        format!("{}{}", self.endpoint, self.listing_path)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_builder() {
        let config = SyncConfig::new("https://data.example.com")
            .with_listing_path("/v2/items.json")
            .with_api_key("secret")
            .with_timeout(Duration::from_secs(5))
            .with_worker_threads(0);

        assert_eq!(config.listing_url(), "https://data.example.com/v2/items.json");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.worker_threads, 1);
    }

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.listing_path, "/listing.json");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.worker_threads, 2);
        assert!(config.api_key.is_none());
    }
}
