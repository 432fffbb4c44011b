//! Local storage representation of a habit.

use crate::date_key::DateKey;
use crate::error::{ModelError, ModelResult};
use crate::habit::{weekday_from_iso, weekday_to_iso, Habit, HabitId};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

const NANOS_PER_MILLI: u32 = 1_000_000;

/// A habit as persisted by a local store.
///
/// All fields are primitives so any store can persist them without knowing
/// chrono. `start_date_key` is derived from `start_date_ms` in the engine's
/// reference offset and only exists to answer date queries.
///
/// Instants and times keep nanosecond precision: the sub-unit parts live in
/// `start_extra_nanos` and `reminder_nanos`, which default to zero for
/// snapshots written without them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitRow {
    /// Habit id.
    pub id: HabitId,
    /// Display name.
    pub name: String,
    /// ISO weekday numbers, 1 = Monday.
    pub frequency: Vec<u8>,
    /// Completed days as days from the common era.
    pub completed_days: Vec<i32>,
    /// Reminder time as seconds after midnight.
    pub reminder_secs: u32,
    /// Fractional part of the reminder second, in nanoseconds.
    #[serde(default)]
    pub reminder_nanos: u32,
    /// Start instant in epoch milliseconds.
    pub start_date_ms: i64,
    /// Nanoseconds of the start instant below the millisecond.
    #[serde(default)]
    pub start_extra_nanos: u32,
    /// UTC offset of the start instant, in seconds.
    pub start_offset_secs: i32,
    /// Start of the start day in the reference offset. Query column.
    ///
    /// Fixed when the row is written. Rows written under a different
    /// reference offset keep their old key until they are written again, so
    /// a store must be read with the offset it was filled with.
    pub start_date_key: DateKey,
}

impl HabitRow {
    /// Returns true if the row is visible in a query for `key`.
    pub fn is_visible_on(&self, key: DateKey) -> bool {
        self.start_date_key <= key
    }
}

impl Habit {
    /// Converts into the local storage shape, deriving the query key in `reference`.
    pub fn to_row(&self, reference: FixedOffset) -> HabitRow {
        HabitRow {
            id: self.id.clone(),
            name: self.name.clone(),
            frequency: self.frequency.iter().copied().map(weekday_to_iso).collect(),
            completed_days: self
                .completed_dates
                .iter()
                .map(|day| day.num_days_from_ce())
                .collect(),
            reminder_secs: self.reminder.num_seconds_from_midnight(),
            reminder_nanos: self.reminder.nanosecond(),
            start_date_ms: self.start_date.timestamp_millis(),
            start_extra_nanos: self.start_date.timestamp_subsec_nanos() % NANOS_PER_MILLI,
            start_offset_secs: self.start_date.offset().local_minus_utc(),
            start_date_key: DateKey::from_datetime(&self.start_date, reference),
        }
    }

    /// Rebuilds a habit from its local storage shape.
    pub fn try_from_row(row: &HabitRow) -> ModelResult<Self> {
        let frequency = row
            .frequency
            .iter()
            .map(|&n| weekday_from_iso(n).ok_or(ModelError::InvalidWeekday(n)))
            .collect::<ModelResult<Vec<_>>>()?;

        let mut completed_dates = row
            .completed_days
            .iter()
            .map(|&days| {
                NaiveDate::from_num_days_from_ce_opt(days)
                    .ok_or_else(|| ModelError::InvalidDate(format!("day number {days}")))
            })
            .collect::<ModelResult<Vec<_>>>()?;
        completed_dates.sort_unstable();
        completed_dates.dedup();

        let reminder =
            NaiveTime::from_num_seconds_from_midnight_opt(row.reminder_secs, row.reminder_nanos)
                .ok_or_else(|| {
                    ModelError::InvalidTime(format!(
                        "{} seconds {} nanos",
                        row.reminder_secs, row.reminder_nanos
                    ))
                })?;

        let offset = FixedOffset::east_opt(row.start_offset_secs)
            .ok_or(ModelError::InvalidOffset(row.start_offset_secs))?;
        if row.start_extra_nanos >= NANOS_PER_MILLI {
            return Err(ModelError::InvalidTimestamp(row.start_date_ms));
        }
        let start_date = DateTime::from_timestamp_millis(row.start_date_ms)
            .and_then(|ms| ms.checked_add_signed(Duration::nanoseconds(row.start_extra_nanos.into())))
            .ok_or(ModelError::InvalidTimestamp(row.start_date_ms))?
            .with_timezone(&offset);

        Ok(Self {
            id: row.id.clone(),
            name: row.name.clone(),
            frequency,
            completed_dates,
            reminder,
            start_date,
        })
    }
}

impl TryFrom<HabitRow> for Habit {
    type Error = ModelError;

    fn try_from(row: HabitRow) -> ModelResult<Self> {
        Habit::try_from_row(&row)
    }
}
