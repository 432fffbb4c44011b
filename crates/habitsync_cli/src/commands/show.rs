//! Show command implementation.

use super::HabitReport;
use crate::app::App;
use habitsync_core::HabitId;

/// Runs the show command.
pub async fn run(app: &App, id: &str) -> Result<HabitReport, Box<dyn std::error::Error>> {
    let habit = app.service.habit(&HabitId::new(id)).await?;
    Ok(HabitReport::new(&habit, app.today()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::offline_app;
    use tempfile::tempdir;

    #[tokio::test]
    async fn unknown_habit_reports_not_found() {
        let dir = tempdir().unwrap();
        let app = offline_app(dir.path()).await;

        let err = run(&app, "missing").await.unwrap_err();
        assert_eq!(err.to_string(), "habit not found: missing");
    }
}
