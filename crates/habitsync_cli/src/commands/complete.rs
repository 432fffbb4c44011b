//! Complete command implementation.

use super::HabitReport;
use crate::app::App;
use chrono::NaiveDate;
use habitsync_core::HabitId;

/// Runs the complete command, toggling completion on `date` (today by default).
pub async fn run(
    app: &App,
    id: &str,
    date: Option<NaiveDate>,
) -> Result<HabitReport, Box<dyn std::error::Error>> {
    let date = date.unwrap_or_else(|| app.today());
    let habit = app
        .service
        .toggle_completion(&HabitId::new(id), date)
        .await?;
    Ok(HabitReport::new(&habit, date))
}
