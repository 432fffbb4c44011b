//! Error types for the habit model.

use thiserror::Error;

/// Result type for model conversions.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while converting stored or remote representations into a [`Habit`].
///
/// [`Habit`]: crate::Habit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Weekday number outside the ISO range 1..=7.
    #[error("invalid weekday number {0}, expected 1 (Monday) to 7 (Sunday)")]
    InvalidWeekday(u8),

    /// Reminder time could not be parsed or is out of range.
    #[error("invalid reminder time: {0}")]
    InvalidTime(String),

    /// Calendar date could not be parsed or is out of range.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Timestamp cannot be represented as a date-time.
    #[error("timestamp {0} ms is out of range")]
    InvalidTimestamp(i64),

    /// UTC offset is outside +/- 24h.
    #[error("invalid UTC offset of {0} seconds")]
    InvalidOffset(i32),
}
