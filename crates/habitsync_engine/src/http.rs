//! HTTP remote implementation.
//!
//! The remote is a JSON document store that keeps habits in one collection
//! keyed by id. `GET {base}/habits.json` returns the whole collection as an
//! object (or `null` when empty), and `PATCH` with `{"<id>": habit}` creates
//! or replaces a single entry. The HTTP client itself is abstracted via a
//! trait so tests can route requests without a network.

use crate::config::HttpRemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::remote::RemoteHabitService;
use async_trait::async_trait;
use habitsync_core::{HabitDto, HabitId};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client abstraction.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a GET request and returns the response body.
    async fn get(&self, url: &str) -> RemoteResult<Vec<u8>>;

    /// Sends a PATCH request with a JSON body and returns the response body.
    async fn patch(&self, url: &str, body: Vec<u8>) -> RemoteResult<Vec<u8>>;
}

/// HTTP-based remote habit service.
pub struct HttpRemoteService<C: HttpClient> {
    config: HttpRemoteConfig,
    client: C,
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpRemoteService<C> {
    /// Creates a new HTTP remote.
    pub fn new(config: HttpRemoteConfig, client: C) -> Self {
        Self {
            config,
            client,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HttpRemoteConfig {
        &self.config
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn record<T>(&self, result: RemoteResult<T>) -> RemoteResult<T> {
        match &result {
            Ok(_) => *self.last_error.write() = None,
            Err(e) => *self.last_error.write() = Some(e.to_string()),
        }
        result
    }
}

/// Decodes a collection body into `(id, habit)` pairs ordered by id.
///
/// Entries that are not habit objects are skipped.
fn decode_collection(body: &[u8]) -> RemoteResult<Vec<(HabitId, HabitDto)>> {
    let entries: Option<BTreeMap<String, serde_json::Value>> = serde_json::from_slice(body)
        .map_err(|e| RemoteError::Decode(format!("habit collection: {e}")))?;

    let mut habits = Vec::new();
    for (id, value) in entries.unwrap_or_default() {
        match serde_json::from_value::<HabitDto>(value) {
            Ok(dto) => habits.push((HabitId::new(id), dto)),
            Err(e) => warn!(habit_id = %id, error = %e, "ignoring undecodable remote entry"),
        }
    }
    Ok(habits)
}

#[async_trait]
impl<C: HttpClient> RemoteHabitService for HttpRemoteService<C> {
    async fn fetch_all(&self) -> RemoteResult<Vec<(HabitId, HabitDto)>> {
        let url = self.config.collection_url();
        let result = match self.client.get(&url).await {
            Ok(body) => decode_collection(&body),
            Err(e) => Err(e),
        };
        if let Ok(habits) = &result {
            debug!(url = %url, habits = habits.len(), "fetched remote habits");
        }
        self.record(result)
    }

    async fn insert(&self, id: &HabitId, habit: &HabitDto) -> RemoteResult<()> {
        let url = self.config.collection_url();
        let mut patch = BTreeMap::new();
        patch.insert(id.as_str(), habit);
        let body =
            serde_json::to_vec(&patch).map_err(|e| RemoteError::Encode(e.to_string()))?;

        let result = self.client.patch(&url, body).await.map(|_| ());
        if result.is_ok() {
            debug!(habit_id = %id, "mirrored habit to remote");
        }
        self.record(result)
    }
}

/// [`HttpClient`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Builds a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> RemoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::transport_fatal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn map_error(e: reqwest::Error, url: &str) -> RemoteError {
        if e.is_timeout() {
            RemoteError::Timeout
        } else if e.is_connect() {
            RemoteError::transport_retryable(format!("connection to {url} failed: {e}"))
        } else if e.is_builder() {
            RemoteError::transport_fatal(format!("invalid request to {url}: {e}"))
        } else {
            RemoteError::transport_retryable(format!("request to {url} failed: {e}"))
        }
    }

    async fn read_body(response: reqwest::Response, url: &str) -> RemoteResult<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            let message = format!("HTTP {} from {url}", status.as_u16());
            return Err(if status.is_server_error() || status.as_u16() == 429 {
                RemoteError::transport_retryable(message)
            } else {
                RemoteError::transport_fatal(message)
            });
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(e, url))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> RemoteResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::map_error(e, url))?;
        Self::read_body(response, url).await
    }

    async fn patch(&self, url: &str, body: Vec<u8>) -> RemoteResult<Vec<u8>> {
        let response = self
            .client
            .patch(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Self::map_error(e, url))?;
        Self::read_body(response, url).await
    }
}
