//! Routine route handlers (gated).
//!
//! `/routine/{index}` is the workout player: it walks today's routine one
//! exercise at a time.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use crate::db::routines::RoutineRepository;
use crate::error::AppError;
use crate::models::{Exercise, Routine};
use crate::routes::auth::MessageQuery;
use crate::state::AppState;

/// Routine list template.
#[derive(Template, WebTemplate)]
#[template(path = "routines/index.html")]
pub struct RoutinesTemplate {
    pub routines: Vec<Routine>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Workout player template: one exercise of today's routine.
#[derive(Template, WebTemplate)]
#[template(path = "routines/player.html")]
pub struct PlayerTemplate {
    pub routine: Routine,
    pub exercise: Exercise,
    pub index: usize,
    pub total: usize,
}

/// List all routines.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let routines = RoutineRepository::new(state.pool()).list().await?;

    Ok(RoutinesTemplate {
        routines,
        error: query.error,
        success: query.success,
    }
    .into_response())
}

/// Show today's routine at one exercise position.
///
/// No routine scheduled today sends the member home with a message; an
/// out-of-bounds index restarts the player at the first exercise.
pub async fn player(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Response, AppError> {
    let today = Utc::now().date_naive();
    let Some(workout) = RoutineRepository::new(state.pool())
        .get_for_date(today)
        .await?
    else {
        return Ok(
            Redirect::to("/?error=No+routine+is+scheduled+for+today").into_response(),
        );
    };

    let total = workout.exercises.len();
    let Some(exercise) = workout.exercise_at(index) else {
        if total == 0 {
            return Ok(
                Redirect::to("/?error=Today%27s+routine+has+no+exercises+yet").into_response(),
            );
        }
        return Ok(Redirect::to("/routine/0").into_response());
    };

    Ok(PlayerTemplate {
        routine: workout.routine.clone(),
        exercise: exercise.clone(),
        index,
        total,
    }
    .into_response())
}
