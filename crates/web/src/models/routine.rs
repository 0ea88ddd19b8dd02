//! Routine domain types.

use chrono::{DateTime, NaiveDate, Utc};

use dailyrep_core::RoutineId;

use super::exercise::Exercise;

/// A workout routine scheduled for a calendar date.
#[derive(Debug, Clone)]
pub struct Routine {
    pub id: RoutineId,
    pub title: String,
    pub description: String,
    /// The date this routine is served as "today's workout".
    pub scheduled_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A routine together with its exercises in workout order.
#[derive(Debug, Clone)]
pub struct RoutineWithExercises {
    pub routine: Routine,
    /// Exercises ordered by their position in the routine.
    pub exercises: Vec<Exercise>,
}

impl RoutineWithExercises {
    /// The exercise at a player position, if in bounds.
    #[must_use]
    pub fn exercise_at(&self, index: usize) -> Option<&Exercise> {
        self.exercises.get(index)
    }
}
