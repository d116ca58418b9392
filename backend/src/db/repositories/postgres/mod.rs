//! Diesel store for `pomb.coords`.
//!
//! Reads `DATABASE_URL` (or `PG_DATABASE_URL`) plus the optional `PG_POOL_MAX`,
//! `PG_POOL_MIN`, `PG_CONN_TIMEOUT_SEC`, `PG_IDLE_TIMEOUT_SEC`,
//! `PG_MAX_RETRIES` and `PG_RETRY_DELAY_MS` tuning variables.

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, warn};
use std::time::Duration;
use tokio::task;

use crate::db::models::StoredCoord;
use crate::db::repository::{CoordRepository, ErrorContext, RepositoryError, RepositoryResult};
use crate::tracks::{JunctureId, Statement, StatementBatch};

mod models;
mod schema;

use models::{CoordRow, NewCoordRow};
use schema::coords;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Pool and retry settings for the coords store.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connection_timeout_sec: u64,
    pub idle_timeout_sec: u64,
    /// Extra attempts after a pool or serialization failure.
    pub max_retries: u32,
    /// Doubled after each retry.
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 30,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Missing tuning variables fall back to [`Default`].
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;
        let defaults = Self::default();

        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self { pool, config })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;
        Ok(())
    }

    /// Runs `f` on a pooled connection off the async runtime. Pool and
    /// serialization failures are retried with backoff; constraint
    /// violations return immediately.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        warn!("{}", err);
                        last_error = Some(err);
                        continue;
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        debug!("retrying after transient error: {}", e);
                        last_error = Some(e);
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

#[async_trait]
impl CoordRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn execute_batch(&self, batch: &StatementBatch) -> RepositoryResult<usize> {
        let batch = batch.clone();
        let juncture_id = batch.juncture_id();

        self.with_conn(move |conn| {
            // BEGIN/COMMIT are carried by the diesel transaction itself.
            conn.transaction(|tx| {
                let mut inserted = 0usize;
                for statement in batch.statements() {
                    match statement {
                        Statement::Begin | Statement::Commit => {}
                        Statement::DeleteJuncture(juncture_id) => {
                            diesel::delete(
                                coords::table.filter(coords::juncture_id.eq(juncture_id.value())),
                            )
                            .execute(tx)
                            .map_err(map_diesel_error)?;
                        }
                        Statement::Insert(row) => {
                            inserted += diesel::insert_into(coords::table)
                                .values(NewCoordRow::from(row))
                                .execute(tx)
                                .map_err(map_diesel_error)?;
                        }
                    }
                }
                Ok(inserted)
            })
        })
        .await
        .map_err(|e| e.with_operation("execute_batch").with_juncture(juncture_id))
    }

    async fn fetch_coords(&self, juncture_id: JunctureId) -> RepositoryResult<Vec<StoredCoord>> {
        self.with_conn(move |conn| {
            let rows = coords::table
                .filter(coords::juncture_id.eq(juncture_id.value()))
                .order((coords::coord_time.asc(), coords::coord_id.asc()))
                .select(CoordRow::as_select())
                .load::<CoordRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows.into_iter().map(StoredCoord::from).collect())
        })
        .await
        .map_err(|e| e.with_operation("fetch_coords").with_juncture(juncture_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PostgresConfig::with_url("postgres://localhost/pomb");
        assert_eq!(config.database_url, "postgres://localhost/pomb");
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.idle_timeout_sec, 30);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_new_coord_row_from_insert() {
        use chrono::{TimeZone, Utc};
        let insert = crate::tracks::CoordInsert {
            juncture_id: JunctureId(9),
            lat: 1.5,
            lon: 2.5,
            elevation: None,
            coord_time: Utc.timestamp_opt(0, 0).unwrap(),
        };
        let row = NewCoordRow::from(&insert);
        assert_eq!(row.juncture_id, 9);
        assert_eq!(row.lat, 1.5);
        assert_eq!(row.lon, 2.5);
    }
}
