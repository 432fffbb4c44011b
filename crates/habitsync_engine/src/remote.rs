//! Remote habit service abstraction.

use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use habitsync_core::{HabitDto, HabitId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// A remote service holding a keyed collection of habits.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, a disabled remote, mock for testing, etc.).
#[async_trait]
pub trait RemoteHabitService: Send + Sync {
    /// Fetches every habit in the collection.
    async fn fetch_all(&self) -> RemoteResult<Vec<(HabitId, HabitDto)>>;

    /// Creates or replaces the habit stored under `id`.
    async fn insert(&self, id: &HabitId, habit: &HabitDto) -> RemoteResult<()>;
}

/// A remote that is never reachable.
///
/// Used when no remote is configured: the engine then serves local data only.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRemote;

#[async_trait]
impl RemoteHabitService for OfflineRemote {
    async fn fetch_all(&self) -> RemoteResult<Vec<(HabitId, HabitDto)>> {
        Err(RemoteError::NotConnected)
    }

    async fn insert(&self, _id: &HabitId, _habit: &HabitDto) -> RemoteResult<()> {
        Err(RemoteError::NotConnected)
    }
}

/// A mock remote service for testing.
#[derive(Debug)]
pub struct MockRemoteService {
    connected: AtomicBool,
    fail_inserts: AtomicBool,
    fetch_response: Mutex<Option<Vec<(HabitId, HabitDto)>>>,
    fetch_delay: Mutex<Option<Duration>>,
    inserted: Mutex<Vec<(HabitId, HabitDto)>>,
    fetch_calls: AtomicUsize,
}

impl MockRemoteService {
    /// Creates a connected mock with no fetch response set.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            fail_inserts: AtomicBool::new(false),
            fetch_response: Mutex::new(None),
            fetch_delay: Mutex::new(None),
            inserted: Mutex::new(Vec::new()),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    /// Sets the habits returned by `fetch_all`.
    pub fn set_fetch_response(&self, habits: Vec<(HabitId, HabitDto)>) {
        *self.fetch_response.lock() = Some(habits);
    }

    /// Delays every `fetch_all` call.
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    /// Sets the connected state. A disconnected mock fails every call.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Makes `insert` fail while leaving `fetch_all` alone.
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Returns every successful insert, in call order.
    pub fn inserted(&self) -> Vec<(HabitId, HabitDto)> {
        self.inserted.lock().clone()
    }

    /// Returns how many times `fetch_all` was called.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockRemoteService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteHabitService for MockRemoteService {
    async fn fetch_all(&self) -> RemoteResult<Vec<(HabitId, HabitDto)>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if !self.connected.load(Ordering::SeqCst) {
            return Err(RemoteError::NotConnected);
        }

        self.fetch_response
            .lock()
            .clone()
            .ok_or_else(|| RemoteError::Decode("no mock fetch response set".into()))
    }

    async fn insert(&self, id: &HabitId, habit: &HabitDto) -> RemoteResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(RemoteError::NotConnected);
        }
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(RemoteError::transport_retryable("mock insert failure"));
        }
        self.inserted.lock().push((id.clone(), habit.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(name: &str) -> HabitDto {
        HabitDto {
            name: name.into(),
            frequency: vec![1],
            completed_dates: Vec::new(),
            reminder: "07:00:00".into(),
            start_date: "2024-01-01T00:00:00+00:00".into(),
        }
    }

    #[tokio::test]
    async fn mock_returns_configured_response() {
        let remote = MockRemoteService::new();
        assert!(remote.fetch_all().await.is_err());

        remote.set_fetch_response(vec![(HabitId::new("a"), dto("A"))]);
        let fetched = remote.fetch_all().await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(remote.fetch_calls(), 2);
    }

    #[tokio::test]
    async fn mock_records_inserts() {
        let remote = MockRemoteService::new();
        remote.insert(&HabitId::new("a"), &dto("A")).await.unwrap();

        remote.set_fail_inserts(true);
        let err = remote.insert(&HabitId::new("b"), &dto("B")).await.unwrap_err();
        assert!(err.is_retryable());

        assert_eq!(remote.inserted(), vec![(HabitId::new("a"), dto("A"))]);
    }

    #[tokio::test]
    async fn disconnected_mock_fails_everything() {
        let remote = MockRemoteService::new();
        remote.set_fetch_response(Vec::new());
        remote.set_connected(false);

        assert!(matches!(
            remote.fetch_all().await,
            Err(RemoteError::NotConnected)
        ));
        assert!(remote.insert(&HabitId::new("a"), &dto("A")).await.is_err());
        assert!(remote.inserted().is_empty());
    }

    #[tokio::test]
    async fn offline_remote_is_never_reachable() {
        assert!(matches!(
            OfflineRemote.fetch_all().await,
            Err(RemoteError::NotConnected)
        ));
    }
}
