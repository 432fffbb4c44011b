//! Remote (wire) representation of a habit.

use crate::error::{ModelError, ModelResult};
use crate::habit::{weekday_from_iso, weekday_to_iso, Habit, HabitId};
use chrono::{DateTime, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

const REMINDER_FORMAT: &str = "%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A habit as exchanged with the remote service.
///
/// The id is not part of the body: the remote keys its collection by id.
/// Empty lists may be omitted by the server, so they default to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitDto {
    /// Display name.
    pub name: String,
    /// ISO weekday numbers, 1 = Monday.
    #[serde(default)]
    pub frequency: Vec<u8>,
    /// Completed days as `YYYY-MM-DD`.
    #[serde(default)]
    pub completed_dates: Vec<String>,
    /// Reminder as `HH:MM:SS`, with a fraction when it has one.
    pub reminder: String,
    /// Start instant in RFC 3339.
    pub start_date: String,
}

impl Habit {
    /// Converts into the remote wire shape.
    pub fn to_dto(&self) -> HabitDto {
        HabitDto {
            name: self.name.clone(),
            frequency: self.frequency.iter().copied().map(weekday_to_iso).collect(),
            completed_dates: self
                .completed_dates
                .iter()
                .map(|day| day.format(DATE_FORMAT).to_string())
                .collect(),
            reminder: self.reminder.format(REMINDER_FORMAT).to_string(),
            start_date: self.start_date.to_rfc3339(),
        }
    }

    /// Rebuilds a habit from the remote shape and the id it was keyed by.
    pub fn try_from_dto(id: HabitId, dto: &HabitDto) -> ModelResult<Self> {
        let frequency = dto
            .frequency
            .iter()
            .map(|&n| weekday_from_iso(n).ok_or(ModelError::InvalidWeekday(n)))
            .collect::<ModelResult<Vec<_>>>()?;

        let mut completed_dates = dto
            .completed_dates
            .iter()
            .map(|text| {
                NaiveDate::parse_from_str(text, DATE_FORMAT)
                    .map_err(|e| ModelError::InvalidDate(format!("`{text}`: {e}")))
            })
            .collect::<ModelResult<Vec<_>>>()?;
        completed_dates.sort_unstable();
        completed_dates.dedup();

        let reminder = NaiveTime::parse_from_str(&dto.reminder, REMINDER_FORMAT)
            .map_err(|e| ModelError::InvalidTime(format!("`{}`: {e}", dto.reminder)))?;

        let start_date = DateTime::parse_from_rfc3339(&dto.start_date)
            .map_err(|e| ModelError::InvalidDate(format!("`{}`: {e}", dto.start_date)))?;

        Ok(Self {
            id,
            name: dto.name.clone(),
            frequency,
            completed_dates,
            reminder,
            start_date,
        })
    }
}
