//! Routine repository for database operations.
//!
//! Routine membership lives in `routine_exercises(routine_id, exercise_id,
//! position)`; positions are contiguous from zero and rewritten wholesale on
//! every edit.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use dailyrep_core::{ExerciseId, RoutineId};

use super::RepositoryError;
use crate::models::{Exercise, Routine, RoutineWithExercises};

const ROUTINE_COLUMNS: &str = "id, title, description, scheduled_on, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct RoutineRow {
    id: RoutineId,
    title: String,
    description: String,
    scheduled_on: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RoutineRow> for Routine {
    fn from(r: RoutineRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            scheduled_on: r.scheduled_on,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Repository for routine database operations.
pub struct RoutineRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RoutineRepository<'a> {
    /// Create a new routine repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all routines, most recently scheduled first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Routine>, RepositoryError> {
        let rows: Vec<RoutineRow> = sqlx::query_as(&format!(
            "SELECT {ROUTINE_COLUMNS} FROM routines ORDER BY scheduled_on DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Routine::from).collect())
    }

    /// Get the routine scheduled for a date, with its exercises in order.
    ///
    /// At most one routine is scheduled per date (unique index).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<RoutineWithExercises>, RepositoryError> {
        let row: Option<RoutineRow> = sqlx::query_as(&format!(
            "SELECT {ROUTINE_COLUMNS} FROM routines WHERE scheduled_on = $1"
        ))
        .bind(date)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let routine = Routine::from(row);
        let exercises = self.exercises_for(routine.id).await?;

        Ok(Some(RoutineWithExercises { routine, exercises }))
    }

    /// Create a routine with its ordered exercise list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a routine is already scheduled
    /// for the date.
    pub async fn create(
        &self,
        title: &str,
        description: &str,
        scheduled_on: NaiveDate,
        exercise_ids: &[ExerciseId],
    ) -> Result<Routine, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: RoutineRow = sqlx::query_as(&format!(
            "INSERT INTO routines (title, description, scheduled_on)
             VALUES ($1, $2, $3)
             RETURNING {ROUTINE_COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .bind(scheduled_on)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| super::conflict_on_unique(e, "a routine is already scheduled for that date"))?;

        let routine = Routine::from(row);

        for (position, exercise_id) in exercise_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO routine_exercises (routine_id, exercise_id, position)
                 VALUES ($1, $2, $3)",
            )
            .bind(routine.id)
            .bind(*exercise_id)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(routine)
    }

    async fn exercises_for(&self, id: RoutineId) -> Result<Vec<Exercise>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct JoinedRow {
            id: ExerciseId,
            name: String,
            description: String,
            video_mp4: Option<String>,
            video_webm: Option<String>,
            video_ogg: Option<String>,
            created_at: DateTime<Utc>,
            updated_at: DateTime<Utc>,
        }

        let rows: Vec<JoinedRow> = sqlx::query_as(
            "SELECT e.id, e.name, e.description, e.video_mp4, e.video_webm, e.video_ogg,
                    e.created_at, e.updated_at
             FROM routine_exercises re
             JOIN exercises e ON e.id = re.exercise_id
             WHERE re.routine_id = $1
             ORDER BY re.position",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Exercise {
                id: r.id,
                name: r.name,
                description: r.description,
                video_mp4: r.video_mp4,
                video_webm: r.video_webm,
                video_ogg: r.video_ogg,
                created_at: r.created_at,
                updated_at: r.updated_at,
            })
            .collect())
    }
}
