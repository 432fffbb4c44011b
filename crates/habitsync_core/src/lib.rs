//! # habitsync core
//!
//! Habit data model for habitsync.
//!
//! This crate provides:
//! - `Habit` and its stable `HabitId`
//! - Recurrence helpers (due days, completions, next reminder)
//! - `DateKey`, the calendar-day query key
//! - `HabitRow` (local storage shape) and `HabitDto` (remote wire shape)
//!   with lossless conversions
//!
//! This is a pure model crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod date_key;
mod dto;
mod error;
mod habit;
mod row;

pub use date_key::{DateKey, MILLIS_PER_DAY};
pub use dto::HabitDto;
pub use error::{ModelError, ModelResult};
pub use habit::{weekday_from_iso, weekday_to_iso, Habit, HabitId};
pub use row::HabitRow;
