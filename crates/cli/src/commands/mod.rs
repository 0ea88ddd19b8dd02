//! CLI subcommands.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] dailyrep_web::db::RepositoryError),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to the application database from the environment.
pub async fn connect() -> Result<PgPool, CommandError> {
    let database_url = std::env::var("DAILYREP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("DAILYREP_DATABASE_URL"))?;

    let pool = dailyrep_web::db::create_pool(&SecretString::from(database_url)).await?;
    Ok(pool)
}
