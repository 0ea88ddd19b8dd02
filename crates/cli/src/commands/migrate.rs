//! Database migration command.
//!
//! Applies the migrations embedded from `crates/web/migrations/` to the
//! database named by `DAILYREP_DATABASE_URL` (or `DATABASE_URL`).

use super::{CommandError, connect};

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    tracing::info!("Connecting to database...");
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../web/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
