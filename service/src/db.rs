use sqlx_core::migrate::Migrator;
use sqlx_postgres::{PgPool, PgPoolOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

/// Migrations shipped with the crate.
#[must_use]
pub fn default_migrations_dir() -> PathBuf {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/migrations")).to_path_buf()
}

/// Connect to the database and run migrations
///
/// # Errors
///
/// Returns an error if Postgres stays unreachable past the retry budget or a
/// migration fails.
pub async fn setup_database(config: &DatabaseConfig) -> Result<PgPool, anyhow::Error> {
    let retry_deadline = Duration::from_secs(60); // overall retry budget
    let max_interval = Duration::from_secs(30); // cap single waits
    let mut delay = Duration::from_millis(500);
    let start = Instant::now();

    let pool = loop {
        info!(host = %config.host, port = config.port, "Attempting to connect to Postgres...");

        match PgPoolOptions::new()
            .max_connections(config.max_connections)
            // Allow extra time to acquire a connection during startup bursts
            .acquire_timeout(Duration::from_secs(30))
            .connect(&config.connection_url())
            .await
        {
            Ok(pool) => break pool,
            Err(err) => {
                if start.elapsed() >= retry_deadline {
                    warn!(error = %err, "Postgres not ready; retries exhausted");
                    return Err(err.into());
                }

                warn!(error = %err, "Postgres not ready yet; retrying");
                sleep(delay).await;
                delay = (delay.saturating_mul(2)).min(max_interval);
            }
        }
    };

    let migrations_path = config
        .migrations_dir
        .as_ref()
        .map_or_else(default_migrations_dir, PathBuf::from);
    run_migrations(&pool, &migrations_path).await?;
    Ok(pool)
}

/// Apply every pending migration found in `dir`.
///
/// # Errors
///
/// Returns an error if the directory cannot be read or a migration fails.
pub async fn run_migrations(pool: &PgPool, dir: &Path) -> Result<(), anyhow::Error> {
    let migrator = Migrator::new(dir).await?;
    migrator.run(pool).await?;
    info!(dir = %dir.display(), "Migrations applied");
    Ok(())
}
