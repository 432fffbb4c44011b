//! Alarm scheduler for the command line.

use chrono::{DateTime, FixedOffset, Utc};
use habitsync_core::Habit;
use habitsync_engine::AlarmScheduler;
use tracing::{debug, info, warn};

/// Reports alarms through the log instead of a system alarm service.
///
/// Each scheduled alarm logs the next time it would fire.
#[derive(Debug, Default)]
pub struct LogAlarmScheduler {
    now: Option<DateTime<FixedOffset>>,
}

impl LogAlarmScheduler {
    /// Creates a scheduler that measures from the current time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scheduler that measures from `now`.
    #[cfg(test)]
    pub fn at(now: DateTime<FixedOffset>) -> Self {
        Self { now: Some(now) }
    }

    /// Returns the next time `habit`'s alarm fires.
    pub fn next_trigger(&self, habit: &Habit) -> Option<DateTime<FixedOffset>> {
        let now = self.now.unwrap_or_else(|| Utc::now().fixed_offset());
        habit.next_reminder_after(now)
    }
}

impl AlarmScheduler for LogAlarmScheduler {
    fn cancel(&self, habit: &Habit) {
        debug!(habit_id = %habit.id, "reminder cancelled");
    }

    fn schedule_recurring(&self, habit: &Habit) {
        match self.next_trigger(habit) {
            Some(next) => info!(
                habit_id = %habit.id,
                name = %habit.name,
                next = %next.to_rfc3339(),
                "reminder scheduled"
            ),
            None => warn!(habit_id = %habit.id, "habit has no reminder days"),
        }
    }
}
