//! The habit entity and its recurrence rules.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier shared by the local, remote and alarm representations of a habit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HabitId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for HabitId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A recurring habit with a daily reminder.
///
/// The sync engine treats everything except `id` and `start_date` as opaque
/// payload; the recurrence helpers below are used by the use-case layer and
/// the alarm schedulers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Habit {
    /// Identifier, assigned at creation and never changed.
    pub id: HabitId,
    /// Display name.
    pub name: String,
    /// Weekdays the habit is due on.
    pub frequency: Vec<Weekday>,
    /// Days the habit was completed, sorted ascending without duplicates.
    pub completed_dates: Vec<NaiveDate>,
    /// Time of day the reminder fires.
    pub reminder: NaiveTime,
    /// First day the habit is due.
    pub start_date: DateTime<FixedOffset>,
}

impl Habit {
    /// Creates a habit with a generated id and no completions.
    pub fn new(
        name: impl Into<String>,
        frequency: Vec<Weekday>,
        reminder: NaiveTime,
        start_date: DateTime<FixedOffset>,
    ) -> Self {
        Self::with_id(HabitId::generate(), name, frequency, reminder, start_date)
    }

    /// Creates a habit with a caller-provided id.
    pub fn with_id(
        id: HabitId,
        name: impl Into<String>,
        frequency: Vec<Weekday>,
        reminder: NaiveTime,
        start_date: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            frequency,
            completed_dates: Vec::new(),
            reminder,
            start_date,
        }
    }

    /// Returns the first calendar day of the habit in its own offset.
    pub fn start_day(&self) -> NaiveDate {
        self.start_date.date_naive()
    }

    /// Returns true if the habit has started by `date` and recurs on its weekday.
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        self.start_day() <= date && self.frequency.contains(&date.weekday())
    }

    /// Returns true if `date` is marked as completed.
    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completed_dates.binary_search(&date).is_ok()
    }

    /// Marks `date` as completed, or clears it if it already was.
    ///
    /// Returns the new completion state for `date`.
    pub fn toggle_completion(&mut self, date: NaiveDate) -> bool {
        match self.completed_dates.binary_search(&date) {
            Ok(index) => {
                self.completed_dates.remove(index);
                false
            }
            Err(index) => {
                self.completed_dates.insert(index, date);
                true
            }
        }
    }

    /// Returns the next reminder instant strictly after `after`.
    ///
    /// The reminder is evaluated in the offset of `start_date`. Returns `None`
    /// when the habit has no weekdays.
    pub fn next_reminder_after(&self, after: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let offset = *self.start_date.offset();
        let first_day = after.with_timezone(&offset).date_naive().max(self.start_day());

        (0..=7u64)
            .filter_map(|i| first_day.checked_add_days(Days::new(i)))
            .filter(|day| self.frequency.contains(&day.weekday()))
            .filter_map(|day| offset.from_local_datetime(&day.and_time(self.reminder)).single())
            .find(|candidate| *candidate > after)
    }
}

/// Converts an ISO weekday number (1 = Monday) into a [`Weekday`].
pub fn weekday_from_iso(number: u8) -> Option<Weekday> {
    match number {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

/// Converts a [`Weekday`] into its ISO number (1 = Monday).
pub fn weekday_to_iso(day: Weekday) -> u8 {
    day.number_from_monday() as u8
}
