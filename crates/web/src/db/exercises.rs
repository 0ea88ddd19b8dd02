//! Exercise repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use dailyrep_core::ExerciseId;

use super::{RepositoryError, conflict_on_unique};
use crate::models::Exercise;

const EXERCISE_COLUMNS: &str =
    "id, name, description, video_mp4, video_webm, video_ogg, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ExerciseRow {
    id: ExerciseId,
    name: String,
    description: String,
    video_mp4: Option<String>,
    video_webm: Option<String>,
    video_ogg: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ExerciseRow> for Exercise {
    fn from(r: ExerciseRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            video_mp4: r.video_mp4,
            video_webm: r.video_webm,
            video_ogg: r.video_ogg,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Incoming video paths for create/update; `None` leaves the stored path
/// untouched on update, so a re-upload of one format doesn't drop the rest.
#[derive(Debug, Default)]
pub struct VideoPaths {
    pub mp4: Option<String>,
    pub webm: Option<String>,
    pub ogg: Option<String>,
}

/// Repository for exercise database operations.
pub struct ExerciseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ExerciseRepository<'a> {
    /// Create a new exercise repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all exercises, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Exercise>, RepositoryError> {
        let rows: Vec<ExerciseRow> =
            sqlx::query_as(&format!("SELECT {EXERCISE_COLUMNS} FROM exercises ORDER BY name"))
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Exercise::from).collect())
    }

    /// Get an exercise by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ExerciseId) -> Result<Option<Exercise>, RepositoryError> {
        let row: Option<ExerciseRow> =
            sqlx::query_as(&format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(Exercise::from))
    }

    /// Create an exercise.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        videos: &VideoPaths,
    ) -> Result<Exercise, RepositoryError> {
        let row: ExerciseRow = sqlx::query_as(&format!(
            "INSERT INTO exercises (name, description, video_mp4, video_webm, video_ogg)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {EXERCISE_COLUMNS}"
        ))
        .bind(name)
        .bind(description)
        .bind(&videos.mp4)
        .bind(&videos.webm)
        .bind(&videos.ogg)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "exercise name already exists"))?;

        Ok(row.into())
    }

    /// Update an exercise; video paths are only replaced where provided.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the exercise doesn't exist.
    pub async fn update(
        &self,
        id: ExerciseId,
        name: &str,
        description: &str,
        videos: &VideoPaths,
    ) -> Result<Exercise, RepositoryError> {
        let row: Option<ExerciseRow> = sqlx::query_as(&format!(
            "UPDATE exercises SET
                name = $2, description = $3,
                video_mp4 = COALESCE($4, video_mp4),
                video_webm = COALESCE($5, video_webm),
                video_ogg = COALESCE($6, video_ogg),
                updated_at = now()
             WHERE id = $1
             RETURNING {EXERCISE_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(&videos.mp4)
        .bind(&videos.webm)
        .bind(&videos.ogg)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "exercise name already exists"))?;

        row.map(Exercise::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete an exercise and its routine memberships.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the exercise doesn't exist.
    pub async fn delete(&self, id: ExerciseId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
