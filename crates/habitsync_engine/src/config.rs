//! Configuration for the sync engine and the HTTP remote.

use chrono::{FixedOffset, Offset, Utc};
use std::time::Duration;

/// Configuration for the sync engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Offset in which dates are truncated to build query keys.
    ///
    /// Keys are stored with each row, so reopen a store with the offset it
    /// was written with.
    pub reference_offset: FixedOffset,
    /// Upper bound for the background remote fetch. `None` waits forever.
    pub fetch_timeout: Option<Duration>,
    /// Whether inserts are mirrored to the remote service.
    pub mirror_writes: bool,
}

impl EngineConfig {
    /// Creates a configuration for the given reference offset.
    pub fn new(reference_offset: FixedOffset) -> Self {
        Self {
            reference_offset,
            fetch_timeout: None,
            mirror_writes: true,
        }
    }

    /// Sets a timeout for the background remote fetch.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Enables or disables mirroring of inserts to the remote.
    pub fn with_mirror_writes(mut self, enabled: bool) -> Self {
        self.mirror_writes = enabled;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}

/// Configuration for [`HttpRemoteService`](crate::HttpRemoteService).
#[derive(Debug, Clone)]
pub struct HttpRemoteConfig {
    /// Base URL of the service (e.g., "https://habits.example.com").
    pub base_url: String,
    /// Name of the remote collection; requests go to `{base_url}/{collection}.json`.
    pub collection: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl HttpRemoteConfig {
    /// Creates a configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: "habits".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the remote collection name.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the URL of the habit collection.
    pub fn collection_url(&self) -> String {
        format!("{}/{}.json", self.base_url, self.collection)
    }
}
