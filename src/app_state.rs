use std::sync::Arc;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

use crate::app_error::AppError;
use crate::config::Config;

pub type DbPool = Pool<AsyncPgConnection>;
pub type DbConnection<'a> = PooledConnection<'a, AsyncPgConnection>;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub settings: Arc<Config>,
}

impl AppState {
    pub fn new(db_pool: DbPool, settings: Config) -> Self {
        Self {
            db_pool,
            settings: Arc::new(settings),
        }
    }

    /// Checks a connection out of the pool; a checkout failure is the
    /// transient `StoreUnavailable` class, not an internal error.
    pub async fn conn(&self) -> Result<DbConnection<'_>, AppError> {
        self.db_pool
            .get()
            .await
            .map_err(|err| AppError::StoreUnavailable(err.to_string()))
    }
}
