//! Local habit store abstraction.
//!
//! The local store is the single source of truth that observers read from.
//! Queries are live: a subscriber sees the current rows immediately and a
//! fresh snapshot after every successful write.

use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use habitsync_core::{DateKey, HabitId, HabitRow};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};

/// A live stream of row snapshots.
pub type RowStream = Pin<Box<dyn Stream<Item = StoreResult<Vec<HabitRow>>> + Send>>;

/// Persistent, observable storage for habit rows.
#[async_trait]
pub trait LocalHabitStore: Send + Sync {
    /// Observes rows whose start day is on or before `key`.
    ///
    /// The stream yields the current snapshot first, then a new snapshot
    /// after each successful write. Snapshots are ordered by start instant,
    /// then id. Writes landing in quick succession may be coalesced.
    fn observe_by_date(&self, key: DateKey) -> RowStream;

    /// Inserts the row, replacing any row with the same id.
    async fn upsert(&self, row: HabitRow) -> StoreResult<()>;

    /// Looks up a row by id.
    async fn find_by_id(&self, id: &HabitId) -> StoreResult<Option<HabitRow>>;
}

/// In-memory habit store.
///
/// Cloning yields another handle onto the same rows.
#[derive(Clone)]
pub struct MemoryHabitStore {
    inner: Arc<MemoryState>,
}

struct MemoryState {
    rows: RwLock<BTreeMap<HabitId, HabitRow>>,
    revision: watch::Sender<u64>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryState {
    fn snapshot(&self, key: DateKey) -> StoreResult<Vec<HabitRow>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".into()));
        }

        let mut visible: Vec<HabitRow> = self
            .rows
            .read()
            .values()
            .filter(|row| row.is_visible_on(key))
            .cloned()
            .collect();
        visible.sort_by(|a, b| {
            a.start_date_ms
                .cmp(&b.start_date_ms)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(visible)
    }
}

impl MemoryHabitStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    /// Creates a store seeded with `rows`. Later rows win on duplicate ids.
    pub fn with_rows(rows: impl IntoIterator<Item = HabitRow>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| (row.id.clone(), row))
            .collect::<BTreeMap<_, _>>();
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(MemoryState {
                rows: RwLock::new(rows),
                revision,
                fail_reads: AtomicBool::new(false),
                fail_writes: AtomicBool::new(false),
            }),
        }
    }

    /// Returns every row, ordered by id.
    pub fn rows(&self) -> Vec<HabitRow> {
        self.inner.rows.read().values().cloned().collect()
    }

    /// Returns the number of stored rows.
    pub fn len(&self) -> usize {
        self.inner.rows.read().len()
    }

    /// Returns true if the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.inner.rows.read().is_empty()
    }

    /// Returns how many writes have been committed.
    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    /// Makes every read (lookups and observed snapshots) fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn commit(&self, row: HabitRow) -> StoreResult<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".into()));
        }
        self.inner.rows.write().insert(row.id.clone(), row);
        self.inner.revision.send_modify(|revision| *revision += 1);
        Ok(())
    }

    pub(crate) fn lookup(&self, id: &HabitId) -> StoreResult<Option<HabitRow>> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("reads disabled".into()));
        }
        Ok(self.inner.rows.read().get(id).cloned())
    }
}

impl Default for MemoryHabitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalHabitStore for MemoryHabitStore {
    fn observe_by_date(&self, key: DateKey) -> RowStream {
        let state = Arc::clone(&self.inner);
        let changes = WatchStream::new(self.inner.revision.subscribe());
        Box::pin(changes.map(move |_| state.snapshot(key)))
    }

    async fn upsert(&self, row: HabitRow) -> StoreResult<()> {
        self.commit(row)
    }

    async fn find_by_id(&self, id: &HabitId) -> StoreResult<Option<HabitRow>> {
        self.lookup(id)
    }
}
