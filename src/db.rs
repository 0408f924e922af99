use anyhow::{Context, Result, anyhow};
use diesel::{Connection, PgConnection};
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};

use crate::app_state::DbPool;

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = DbPool::builder()
        .build(manager)
        .await
        .context("Failed to build DB connection pool")?;
    Ok(pool)
}

/// Applies pending embedded migrations on a blocking thread. Migrations use a
/// synchronous connection since diesel_migrations drives DDL statement by
/// statement.
pub async fn run_migrations_blocking(
    migrations: EmbeddedMigrations,
    database_url: &str,
) -> Result<usize> {
    let database_url = database_url.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url)
            .context("Failed to establish migration connection")?;
        let applied = conn
            .run_pending_migrations(migrations)
            .map_err(|err| anyhow!("Failed to run migrations: {err}"))?;
        Ok(applied.len())
    })
    .await
    .context("Migration task panicked")?
}
