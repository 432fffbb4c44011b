//! List command implementation.

use super::HabitReport;
use crate::app::App;
use chrono::NaiveDate;
use tokio_stream::StreamExt;

/// Runs the list command.
///
/// Lists habits due on `date` (today by default), or every started habit
/// with `all`. Waits for the remote refresh so the listing includes it.
pub async fn run(
    app: &App,
    date: Option<NaiveDate>,
    all: bool,
) -> Result<Vec<HabitReport>, Box<dyn std::error::Error>> {
    let date = date.unwrap_or_else(|| app.today());
    let mut habits = if all {
        app.service.engine().habits_for_day(date)
    } else {
        app.service.habits_due_on(date)
    };

    app.settle().await;
    let latest = habits.next().await.ok_or("habit stream ended")??;

    Ok(latest
        .iter()
        .map(|habit| HabitReport::new(habit, date))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{add, test_support::offline_app};
    use chrono::{NaiveTime, Weekday};
    use tempfile::tempdir;

    #[tokio::test]
    async fn lists_due_habits_only_unless_all() {
        let dir = tempdir().unwrap();
        let app = offline_app(dir.path()).await;
        let start = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let seven = NaiveTime::from_hms_opt(7, 0, 0).unwrap();

        add::run(&app, "Weekday run", vec![Weekday::Mon, Weekday::Fri], seven, Some(start))
            .await
            .unwrap();
        add::run(&app, "Sunday call", vec![Weekday::Sun], seven, Some(start))
            .await
            .unwrap();

        // 2024-03-08 is a Friday.
        let friday = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        let due = run(&app, Some(friday), false).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].name, "Weekday run");
        assert!(!due[0].completed);

        let all = run(&app, Some(friday), true).await.unwrap();
        assert_eq!(all.len(), 2);

        let before_start = run(&app, NaiveDate::from_ymd_opt(2024, 3, 1), true)
            .await
            .unwrap();
        assert!(before_start.is_empty());
    }
}
