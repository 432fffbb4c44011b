//! The habit sync engine.

use crate::alarm::AlarmScheduler;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, RemoteError};
use crate::remote::RemoteHabitService;
use crate::store::LocalHabitStore;
use chrono::{DateTime, NaiveDate, TimeZone};
use habitsync_core::{DateKey, Habit, HabitId};
use parking_lot::{Mutex, RwLock};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, error, info, warn};

/// A live stream of habit lists for one day.
pub type HabitStream = Pin<Box<dyn Stream<Item = EngineResult<Vec<Habit>>> + Send>>;

/// Statistics about engine activity.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Remote refreshes started.
    pub refreshes_started: u64,
    /// Remote refreshes that reached the local store.
    pub refreshes_completed: u64,
    /// Remote fetches that failed or timed out.
    pub remote_failures: u64,
    /// Remote habits written to the local store.
    pub habits_merged: u64,
    /// Remote habits skipped because they could not be converted.
    pub habits_skipped: u64,
    /// Inserts handed to the remote mirror.
    pub mirror_attempts: u64,
    /// Remote mirror writes that failed.
    pub mirror_failures: u64,
    /// Last completed refresh.
    pub last_refresh_time: Option<Instant>,
    /// Last remote error message.
    pub last_error: Option<String>,
}

/// Result of one remote refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fetch succeeded and its habits were written locally.
    Merged {
        /// Habits written to the local store.
        merged: usize,
        /// Entries dropped because they could not be converted.
        skipped: usize,
    },
    /// The remote could not be reached. Nothing was written.
    RemoteUnavailable,
}

/// The sync engine keeps a local habit store, its alarms and a remote mirror
/// in step.
///
/// Cloning yields another handle onto the same engine.
pub struct SyncEngine<S, R, A> {
    inner: Arc<EngineInner<S, R, A>>,
}

struct EngineInner<S, R, A> {
    config: EngineConfig,
    store: S,
    remote: R,
    alarms: A,
    stats: RwLock<SyncStats>,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl<S, R, A> Clone for SyncEngine<S, R, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, R, A> SyncEngine<S, R, A>
where
    S: LocalHabitStore + 'static,
    R: RemoteHabitService + 'static,
    A: AlarmScheduler + 'static,
{
    /// Creates a new engine over its three collaborators.
    pub fn new(config: EngineConfig, store: S, remote: R, alarms: A) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                config,
                store,
                remote,
                alarms,
                stats: RwLock::new(SyncStats::default()),
                background: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Returns the local store.
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Returns the remote service.
    pub fn remote(&self) -> &R {
        &self.inner.remote
    }

    /// Returns the alarm scheduler.
    pub fn alarms(&self) -> &A {
        &self.inner.alarms
    }

    /// Returns a snapshot of the statistics.
    pub fn stats(&self) -> SyncStats {
        self.inner.stats.read().clone()
    }

    /// Truncates `date` to its query key in the reference offset.
    pub fn date_key<Tz: TimeZone>(&self, date: &DateTime<Tz>) -> DateKey {
        DateKey::from_datetime(date, self.inner.config.reference_offset)
    }

    /// Observes the habits visible on the day containing `date`.
    ///
    /// See [`habits_for_key`](Self::habits_for_key).
    pub fn habits_for_date<Tz: TimeZone>(&self, date: &DateTime<Tz>) -> HabitStream {
        self.habits_for_key(self.date_key(date))
    }

    /// Observes the habits visible on `day` in the reference offset.
    pub fn habits_for_day(&self, day: NaiveDate) -> HabitStream {
        self.habits_for_key(DateKey::from_date(day, self.inner.config.reference_offset))
    }

    /// Observes the habits whose start day is on or before `key`.
    ///
    /// The stream emits the local store's current content immediately and
    /// again after every local write. It also launches one background
    /// remote refresh whose results reach the stream only through the local
    /// store. Dropping the stream does not cancel that refresh; use
    /// [`settle`](Self::settle) to wait for it.
    ///
    /// Remote failures never reach the stream. Local store failures and
    /// unreadable rows are emitted as errors.
    pub fn habits_for_key(&self, key: DateKey) -> HabitStream {
        let rows = self.inner.store.observe_by_date(key);

        let engine = self.clone();
        self.spawn_background(async move {
            if let Err(err) = engine.refresh_from_remote().await {
                error!(error = %err, "writing remote habits locally failed");
            }
        });

        Box::pin(rows.map(|snapshot| -> EngineResult<Vec<Habit>> {
            snapshot?
                .iter()
                .map(|row| {
                    Habit::try_from_row(row).map_err(|source| EngineError::CorruptRecord {
                        id: row.id.clone(),
                        source,
                    })
                })
                .collect()
        }))
    }

    /// Inserts or replaces a habit.
    ///
    /// Returns once the alarm is re-paired and the local store has
    /// acknowledged the write. The remote mirror runs detached and its
    /// outcome is only logged.
    ///
    /// Concurrent inserts of the same id are not serialized and may briefly
    /// leave two alarms scheduled for it.
    pub async fn insert(&self, habit: &Habit) -> EngineResult<()> {
        self.pair_and_persist(habit).await?;
        debug!(habit_id = %habit.id, "habit stored locally");

        if self.inner.config.mirror_writes {
            self.spawn_mirror(habit);
        }
        Ok(())
    }

    /// Looks up a habit in the local store.
    ///
    /// Fails with [`EngineError::NotFound`] if no habit has this id.
    pub async fn habit_by_id(&self, id: &HabitId) -> EngineResult<Habit> {
        let row = self
            .inner
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(id.clone()))?;
        Habit::try_from_row(&row).map_err(|source| EngineError::CorruptRecord {
            id: id.clone(),
            source,
        })
    }

    /// Fetches every remote habit and merges it into the local store.
    ///
    /// Remote failures yield [`RefreshOutcome::RemoteUnavailable`]; only a
    /// local store failure is returned as an error.
    pub async fn refresh_from_remote(&self) -> EngineResult<RefreshOutcome> {
        self.inner.stats.write().refreshes_started += 1;

        let fetched = match self.inner.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, self.inner.remote.fetch_all())
                .await
                .unwrap_or(Err(RemoteError::Timeout)),
            None => self.inner.remote.fetch_all().await,
        };

        let entries = match fetched {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    error = %err,
                    retryable = err.is_retryable(),
                    "remote fetch failed, serving local habits only"
                );
                let mut stats = self.inner.stats.write();
                stats.remote_failures += 1;
                stats.last_error = Some(err.to_string());
                return Ok(RefreshOutcome::RemoteUnavailable);
            }
        };

        let mut habits = Vec::with_capacity(entries.len());
        let mut skipped = 0;
        for (id, dto) in entries {
            match Habit::try_from_dto(id.clone(), &dto) {
                Ok(habit) => habits.push(habit),
                Err(err) => {
                    warn!(habit_id = %id, error = %err, "skipping malformed remote habit");
                    skipped += 1;
                }
            }
        }

        let merged = self.apply_remote_habits(&habits).await?;

        {
            let mut stats = self.inner.stats.write();
            stats.refreshes_completed += 1;
            stats.habits_merged += merged as u64;
            stats.habits_skipped += skipped as u64;
            stats.last_refresh_time = Some(Instant::now());
        }
        info!(merged, skipped, "merged remote habits");

        Ok(RefreshOutcome::Merged { merged, skipped })
    }

    /// Writes habits that came from the remote, in order.
    ///
    /// Each habit gets its alarm re-paired and is upserted locally. Nothing is
    /// mirrored back. Applying the same habits again leaves the same state.
    pub async fn apply_remote_habits(&self, habits: &[Habit]) -> EngineResult<usize> {
        for habit in habits {
            self.pair_and_persist(habit).await?;
        }
        Ok(habits.len())
    }

    /// Waits for every background task launched so far.
    ///
    /// Tasks launched while waiting are awaited too.
    pub async fn settle(&self) {
        loop {
            let pending = std::mem::take(&mut *self.inner.background.lock());
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(err) = handle.await {
                    error!(error = %err, "background task failed");
                }
            }
        }
    }

    async fn pair_and_persist(&self, habit: &Habit) -> EngineResult<()> {
        let previous = self.pair_alarm(habit).await;
        let row = habit.to_row(self.inner.config.reference_offset);
        if let Err(err) = self.inner.store.upsert(row).await {
            // The store still holds the previous version; restore its alarm.
            self.inner.alarms.cancel(habit);
            if let Some(previous) = &previous {
                self.inner.alarms.schedule_recurring(previous);
            }
            warn!(
                habit_id = %habit.id,
                error = %err,
                restored = previous.is_some(),
                "local write failed, alarm rolled back"
            );
            return Err(err.into());
        }
        Ok(())
    }

    /// Cancels the previous alarm for the habit, if any, then schedules a new one.
    ///
    /// Returns the previous version whose alarm was cancelled.
    async fn pair_alarm(&self, habit: &Habit) -> Option<Habit> {
        let previous = match self.inner.store.find_by_id(&habit.id).await {
            Ok(Some(row)) => match Habit::try_from_row(&row) {
                Ok(previous) => {
                    self.inner.alarms.cancel(&previous);
                    Some(previous)
                }
                Err(err) => {
                    warn!(
                        habit_id = %habit.id,
                        error = %err,
                        "previous record unreadable, its alarm was not cancelled"
                    );
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                warn!(
                    habit_id = %habit.id,
                    error = %err,
                    "previous habit lookup failed, treating as new"
                );
                None
            }
        };
        self.inner.alarms.schedule_recurring(habit);
        previous
    }

    fn spawn_mirror(&self, habit: &Habit) {
        self.inner.stats.write().mirror_attempts += 1;

        let engine = self.clone();
        let id = habit.id.clone();
        let dto = habit.to_dto();
        self.spawn_background(async move {
            match engine.inner.remote.insert(&id, &dto).await {
                Ok(()) => debug!(habit_id = %id, "habit mirrored to remote"),
                Err(err) => {
                    warn!(
                        habit_id = %id,
                        error = %err,
                        retryable = err.is_retryable(),
                        "remote mirror failed"
                    );
                    let mut stats = engine.inner.stats.write();
                    stats.mirror_failures += 1;
                    stats.last_error = Some(err.to_string());
                }
            }
        });
    }

    fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = match Handle::try_current() {
            Ok(runtime) => runtime.spawn(task),
            Err(_) => {
                warn!("no async runtime available, background task dropped");
                return;
            }
        };
        let mut background = self.inner.background.lock();
        background.retain(|pending| !pending.is_finished());
        background.push(handle);
    }
}
