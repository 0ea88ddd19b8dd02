//! Database seed command.
//!
//! Loads a small set of demo exercises and schedules a week of routines
//! starting today. Intended for development environments; running it twice
//! is harmless, existing rows are left alone.

use chrono::{Duration, Utc};

use dailyrep_web::db::{
    ExerciseRepository, RepositoryError, RoutineRepository, exercises::VideoPaths,
};

use super::{CommandError, connect};

const EXERCISES: &[(&str, &str)] = &[
    ("Squat", "Feet shoulder-width apart, sit back and down, drive up through the heels."),
    ("Push-up", "Hands under shoulders, body in one line, lower until the chest grazes the floor."),
    ("Plank", "Forearms down, glutes tight, hold a straight line from head to heels."),
    ("Lunge", "Step forward, drop the back knee toward the floor, push back to standing."),
    ("Burpee", "Squat, kick back to a plank, jump the feet in, and leap."),
];

const ROUTINES: &[(&str, &str)] = &[
    ("Foundation Day", "Full-body basics to groove the movement patterns."),
    ("Leg Day", "Lower-body volume with squats and lunges."),
    ("Push Day", "Upper-body pressing and core stability."),
    ("Engine Day", "Conditioning circuit, minimal rest."),
    ("Reset Day", "Light movement and holds for recovery."),
    ("Mixed Day", "A bit of everything at moderate effort."),
    ("Test Day", "Max reps on the basics, note your numbers."),
];

/// How many exercises each seeded routine gets.
const EXERCISES_PER_ROUTINE: usize = 3;

/// Seed demo content.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a write fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    let exercises = ExerciseRepository::new(&pool);
    for (name, description) in EXERCISES {
        match exercises
            .create(name, description, &VideoPaths::default())
            .await
        {
            Ok(_) => {}
            // Already seeded.
            Err(RepositoryError::Conflict(_)) => {
                tracing::debug!(name, "Exercise exists, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }
    tracing::info!(count = EXERCISES.len(), "Exercises seeded");

    let available: Vec<_> = exercises.list().await?.into_iter().map(|e| e.id).collect();
    let routines = RoutineRepository::new(&pool);
    let today = Utc::now().date_naive();

    for (offset, (title, description)) in ROUTINES.iter().enumerate() {
        let scheduled_on = today + Duration::days(i64::try_from(offset).unwrap_or(0));

        // Rotate through the exercise list so each day differs.
        let picks: Vec<_> = available
            .iter()
            .cycle()
            .skip(offset % available.len().max(1))
            .take(EXERCISES_PER_ROUTINE.min(available.len()))
            .copied()
            .collect();

        match routines
            .create(title, description, scheduled_on, &picks)
            .await
        {
            Ok(_) => {}
            // A routine is already scheduled for this date.
            Err(RepositoryError::Conflict(_)) => {
                tracing::debug!(%scheduled_on, "Routine exists, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }
    tracing::info!(count = ROUTINES.len(), "Routines seeded");

    Ok(())
}
