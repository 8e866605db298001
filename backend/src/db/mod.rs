//! PostgreSQL pool setup, embedded migrations and liveness probing

use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::MigrateError;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::config::Config;

const APPLICATION_NAME: &str = "loanbook";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Invalid DATABASE_URL: {0}")]
    InvalidUrl(sqlx::Error),

    #[error("Failed to connect to database: {0}")]
    Connect(sqlx::Error),

    #[error("Failed to run migrations: {0}")]
    Migrate(#[from] MigrateError),
}

/// Connect to the configured database. Sessions are tagged with the
/// application name so they can be told apart in `pg_stat_activity`.
pub async fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    let options = PgConnectOptions::from_str(&config.database_url)
        .map_err(DbError::InvalidUrl)?
        .application_name(APPLICATION_NAME);

    tracing::info!(
        url = %config.database_url_masked(),
        max_connections = config.db_max_connections,
        "Connecting to database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .connect_with(options)
        .await
        .map_err(DbError::Connect)?;

    Ok(pool)
}

/// Apply the migrations embedded from `backend/migrations`
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    let migrator = sqlx::migrate!("./migrations");
    migrator.run(pool).await?;

    tracing::info!(applied = migrator.iter().count(), "Database schema up to date");

    Ok(())
}

/// Pool plus schema, ready for the services
pub async fn connect_and_migrate(config: &Config) -> Result<PgPool, DbError> {
    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Outcome of a liveness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseStatus {
    Connected,
    Unavailable(String),
}

impl DatabaseStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, DatabaseStatus::Connected)
    }

    /// Short form used in the health payload
    pub fn describe(&self) -> String {
        match self {
            DatabaseStatus::Connected => "connected".to_string(),
            DatabaseStatus::Unavailable(reason) => format!("error: {}", reason),
        }
    }
}

/// Round-trip a trivial query
pub async fn check_health(pool: &PgPool) -> DatabaseStatus {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => DatabaseStatus::Connected,
        Err(e) => {
            tracing::warn!(error = %e, "Database health probe failed");
            DatabaseStatus::Unavailable(e.to_string())
        }
    }
}
