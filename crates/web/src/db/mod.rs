//! Database operations for the application's `PostgreSQL` store.
//!
//! Local data only; the payment gateway is the source of truth for customers
//! and subscriptions, of which only the linking identifiers are stored here.
//!
//! ## Tables
//!
//! - `users` - Member accounts and profile/address fields
//! - `user_passwords` - Password hashes, one row per member
//! - `password_reset_tokens` - Hashed one-hour reset tokens
//! - `exercises` - Exercise library with uploaded video paths
//! - `routines` / `routine_exercises` - Scheduled workouts and their ordered
//!   exercises
//! - `sessions` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations live in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p dailyrep-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod exercises;
pub mod routines;
pub mod users;

pub use exercises::ExerciseRepository;
pub use routines::RoutineRepository;
pub use users::UserRepository;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value failed domain validation on the way out.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The referenced row does not exist.
    #[error("not found")]
    NotFound,

    /// A uniqueness or state constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-violation database error into a domain conflict.
fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}
