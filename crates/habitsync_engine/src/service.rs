//! Habit use cases built on the sync engine.

use crate::alarm::AlarmScheduler;
use crate::engine::{HabitStream, SyncEngine};
use crate::error::{EngineError, EngineResult};
use crate::remote::RemoteHabitService;
use crate::store::LocalHabitStore;
use chrono::NaiveDate;
use habitsync_core::{Habit, HabitId};
use tokio_stream::StreamExt;
use tracing::info;

/// Day-to-day habit operations: what is due, checking off, saving.
pub struct HabitService<S, R, A> {
    engine: SyncEngine<S, R, A>,
}

impl<S, R, A> HabitService<S, R, A>
where
    S: LocalHabitStore + 'static,
    R: RemoteHabitService + 'static,
    A: AlarmScheduler + 'static,
{
    /// Creates a service over `engine`.
    pub fn new(engine: SyncEngine<S, R, A>) -> Self {
        Self { engine }
    }

    /// Returns the underlying engine.
    pub fn engine(&self) -> &SyncEngine<S, R, A> {
        &self.engine
    }

    /// Observes the habits due on `date`: started by then and scheduled on its weekday.
    pub fn habits_due_on(&self, date: NaiveDate) -> HabitStream {
        Box::pin(self.engine.habits_for_day(date).map(move |snapshot| {
            snapshot.map(|habits| {
                habits
                    .into_iter()
                    .filter(|habit| habit.is_due_on(date))
                    .collect()
            })
        }))
    }

    /// Flips the completion of `id` on `date` and stores the result.
    pub async fn toggle_completion(&self, id: &HabitId, date: NaiveDate) -> EngineResult<Habit> {
        let mut habit = self.engine.habit_by_id(id).await?;
        let completed = habit.toggle_completion(date);
        self.engine.insert(&habit).await?;
        info!(habit_id = %id, %date, completed, "completion toggled");
        Ok(habit)
    }

    /// Validates and stores a habit.
    pub async fn save(&self, habit: &Habit) -> EngineResult<()> {
        if habit.name.trim().is_empty() {
            return Err(EngineError::InvalidHabit("name must not be empty".into()));
        }
        self.engine.insert(habit).await
    }

    /// Looks up a habit by id.
    pub async fn habit(&self, id: &HabitId) -> EngineResult<Habit> {
        self.engine.habit_by_id(id).await
    }
}
