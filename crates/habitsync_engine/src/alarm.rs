//! Reminder alarm scheduling.

use habitsync_core::{Habit, HabitId};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Schedules recurring reminder alarms for habits.
///
/// Both operations are fire-and-forget: a platform that cannot schedule an
/// alarm reports it through its own channel, never to the engine.
pub trait AlarmScheduler: Send + Sync {
    /// Cancels every alarm previously scheduled for `habit`.
    ///
    /// Cancelling a habit with no alarm is a no-op.
    fn cancel(&self, habit: &Habit);

    /// Schedules a weekly alarm at the habit's reminder time on each of its days.
    fn schedule_recurring(&self, habit: &Habit);
}

/// An alarm scheduler that records alarms in memory.
///
/// Keeps one live entry per habit id. Scheduling a habit that still has a
/// live alarm replaces it and counts as a double schedule.
#[derive(Debug, Default)]
pub struct RecordingAlarmScheduler {
    live: RwLock<BTreeMap<HabitId, Habit>>,
    scheduled: AtomicU64,
    cancelled: AtomicU64,
    double_scheduled: AtomicU64,
}

impl RecordingAlarmScheduler {
    /// Creates a scheduler with no alarms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the habit whose alarm is live for `id`, if any.
    pub fn live_alarm(&self, id: &HabitId) -> Option<Habit> {
        self.live.read().get(id).cloned()
    }

    /// Returns the number of live alarms.
    pub fn live_count(&self) -> usize {
        self.live.read().len()
    }

    /// Returns how many times `schedule_recurring` was called.
    pub fn scheduled(&self) -> u64 {
        self.scheduled.load(Ordering::SeqCst)
    }

    /// Returns how many times `cancel` was called.
    pub fn cancelled(&self) -> u64 {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns how many times a habit was scheduled while its alarm was still live.
    pub fn double_scheduled(&self) -> u64 {
        self.double_scheduled.load(Ordering::SeqCst)
    }
}

impl AlarmScheduler for RecordingAlarmScheduler {
    fn cancel(&self, habit: &Habit) {
        self.cancelled.fetch_add(1, Ordering::SeqCst);
        self.live.write().remove(&habit.id);
    }

    fn schedule_recurring(&self, habit: &Habit) {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        let previous = self.live.write().insert(habit.id.clone(), habit.clone());
        if previous.is_some() {
            self.double_scheduled.fetch_add(1, Ordering::SeqCst);
        }
    }
}
