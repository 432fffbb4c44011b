//! Add command implementation.

use crate::app::App;
use chrono::{NaiveDate, NaiveTime, SubsecRound, TimeZone, Utc, Weekday};
use habitsync_core::Habit;
use tracing::info;

/// Runs the add command and returns the stored habit.
pub async fn run(
    app: &App,
    name: &str,
    days: Vec<Weekday>,
    reminder: NaiveTime,
    start: Option<NaiveDate>,
) -> Result<Habit, Box<dyn std::error::Error>> {
    let start_date = match start {
        Some(day) => app
            .offset
            .from_local_datetime(&day.and_time(NaiveTime::MIN))
            .single()
            .ok_or_else(|| format!("{day} has no midnight in the configured offset"))?,
        None => Utc::now().with_timezone(&app.offset).trunc_subsecs(0),
    };

    let mut frequency = Vec::with_capacity(days.len());
    for day in days {
        if !frequency.contains(&day) {
            frequency.push(day);
        }
    }

    let habit = Habit::new(name.trim(), frequency, reminder, start_date);
    app.service.save(&habit).await?;
    info!(habit_id = %habit.id, name = %habit.name, "habit added");
    Ok(habit)
}
