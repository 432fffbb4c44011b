//! CLI command implementations.

pub mod add;
pub mod complete;
pub mod list;
pub mod show;
pub mod sync;

use chrono::{NaiveDate, Utc};
use habitsync_core::Habit;
use serde::Serialize;

/// A habit as printed by the commands.
#[derive(Debug, Serialize)]
pub struct HabitReport {
    /// Habit id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Reminder days, e.g. `Mon`.
    pub days: Vec<String>,
    /// Reminder time as `HH:MM`.
    pub reminder: String,
    /// Start instant in RFC 3339.
    pub start_date: String,
    /// The day the report was made for.
    pub date: NaiveDate,
    /// Whether the habit is completed on `date`.
    pub completed: bool,
    /// Every completed day.
    pub completed_dates: Vec<NaiveDate>,
    /// Next time the reminder fires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_reminder: Option<String>,
}

impl HabitReport {
    /// Describes `habit` as seen on `date`.
    pub fn new(habit: &Habit, date: NaiveDate) -> Self {
        Self {
            id: habit.id.to_string(),
            name: habit.name.clone(),
            days: habit.frequency.iter().map(|day| day.to_string()).collect(),
            reminder: habit.reminder.format("%H:%M").to_string(),
            start_date: habit.start_date.to_rfc3339(),
            date,
            completed: habit.is_completed_on(date),
            completed_dates: habit.completed_dates.clone(),
            next_reminder: habit
                .next_reminder_after(Utc::now().fixed_offset())
                .map(|next| next.to_rfc3339()),
        }
    }

    fn line(&self) -> String {
        format!(
            "[{}] {}  {}  {} at {}",
            if self.completed { "x" } else { " " },
            self.id,
            self.name,
            self.days.join(","),
            self.reminder
        )
    }
}

/// Prints reports as text lines or as a JSON array.
pub fn print_reports(reports: &[HabitReport], format: &str) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(reports)?),
        _ if reports.is_empty() => println!("No habits."),
        _ => {
            for report in reports {
                println!("{}", report.line());
            }
        }
    }
    Ok(())
}

/// Prints one report in detail.
pub fn print_report(report: &HabitReport, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("{}", report.line());
    println!("  Starts:     {}", report.start_date);
    println!(
        "  Next:       {}",
        report.next_reminder.as_deref().unwrap_or("never")
    );
    println!("  Completed:  {} day(s)", report.completed_dates.len());
    if let Some(last) = report.completed_dates.last() {
        println!("  Last done:  {last}");
    }
    Ok(())
}
