use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use sqlx::{
    PgPool,
    migrate::Migrator,
    pool::PoolConnection,
    postgres::{PgConnectOptions, PgPoolOptions},
    Postgres,
};

pub mod dto;
pub mod error;
pub mod models;
pub mod repository;

use error::{Result, StorageError};

/// Schema migrations bundled from `migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Pool tuning applied when the database handle is created.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub statement_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(5),
            statement_timeout: Duration::from_secs(10),
        }
    }
}

/// Shared handle to the Postgres pool. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connects eagerly, failing if the database cannot be reached.
    pub async fn new(database_url: &str, settings: &PoolSettings) -> Result<Self> {
        let options = connect_options(database_url, settings)?;
        let pool = pool_options(settings).connect_with(options).await?;

        Ok(Self { pool })
    }

    /// Builds the pool without opening a connection until one is first needed.
    pub fn connect_lazy(database_url: &str, settings: &PoolSettings) -> Result<Self> {
        let options = connect_options(database_url, settings)?;
        let pool = pool_options(settings).connect_lazy_with(options);

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Checks a connection out of the pool, retrying once on a transient failure.
    /// The connection goes back to the pool when the returned guard is dropped.
    pub async fn acquire(&self) -> Result<PoolConnection<Postgres>> {
        let retry_policy = ConstantBuilder::default()
            .with_delay(Duration::from_millis(200))
            .with_max_times(1);

        (|| async { self.pool.acquire().await })
            .retry(retry_policy)
            .when(StorageError::is_transient)
            .notify(|err, delay| {
                tracing::warn!("Connection acquire failed ({}), retrying in {:?}", err, delay);
            })
            .await
            .map_err(|err| {
                if StorageError::is_transient(&err) {
                    StorageError::Unavailable(err)
                } else {
                    StorageError::from(err)
                }
            })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }
}

fn connect_options(database_url: &str, settings: &PoolSettings) -> Result<PgConnectOptions> {
    let statement_timeout = format!("{}ms", settings.statement_timeout.as_millis());

    let options = database_url
        .parse::<PgConnectOptions>()?
        .options([("statement_timeout", statement_timeout.as_str())]);

    Ok(options)
}

fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
}
