use async_trait::async_trait;
use burrow_core::{Link, LinkRepository, ShortCode, StorageError};
use jiff::Timestamp;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

use crate::Result;

const SCHEMA: &str = include_str!("../ddl/sqlite/links.sql");

/// Connection settings for [`SqliteRepository::connect_with`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct SqliteSettings {
    /// Upper bound on pooled connections.
    #[builder(default = 5)]
    pub max_connections: u32,
    /// How long an operation may wait for a pooled connection.
    #[builder(default = Duration::from_secs(5))]
    pub acquire_timeout: Duration,
    /// Deadline applied to every statement, if any.
    #[builder(default, setter(strip_option))]
    pub statement_timeout: Option<Duration>,
}

impl Default for SqliteSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// SQLite implementation of the repository contract.
///
/// Every operation is a single statement, so no explicit transactions are
/// needed: the visit counter is bumped with `visits = visits + 1` and the
/// engine serialises concurrent writers.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
    statement_timeout: Option<Duration>,
}

impl SqliteRepository {
    /// Creates a repository from an existing SQLite connection pool.
    ///
    /// The `links` table is not created; call [`ensure_schema`](Self::ensure_schema)
    /// if the database may be fresh.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            statement_timeout: None,
        }
    }

    /// Opens a pool for `database_url` with default settings and creates the
    /// `links` table if it does not exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with(database_url, SqliteSettings::default()).await
    }

    /// Opens a pool for `database_url` and creates the `links` table if it
    /// does not exist. The database file is created when missing.
    ///
    /// Note that every connection to `sqlite::memory:` opens a separate
    /// database; use `max_connections = 1` for in-memory URLs.
    pub async fn connect_with(database_url: &str, settings: SqliteSettings) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(map_sqlx_error)?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        let repository = Self {
            pool,
            statement_timeout: settings.statement_timeout,
        };
        repository.ensure_schema().await?;

        debug!(database_url, "sqlite repository ready");
        Ok(repository)
    }

    /// Creates the `links` table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        self.run(sqlx::query(SCHEMA).execute(&self.pool), map_sqlx_error)
            .await?;
        Ok(())
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Runs one statement under the configured deadline.
    async fn run<T, F, E>(&self, statement: F, on_error: E) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>>,
        E: FnOnce(sqlx::Error) -> StorageError,
    {
        let outcome = match self.statement_timeout {
            Some(limit) => tokio::time::timeout(limit, statement)
                .await
                .map_err(|_| StorageError::Timeout(format!("statement exceeded {limit:?}")))?,
            None => statement.await,
        };
        outcome.map_err(on_error)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_)
        | sqlx::Error::Io(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_) => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn link_from_row(row: &SqliteRow) -> Result<Link> {
    let id: String = row.try_get("id").map_err(map_sqlx_error)?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let shortened: String = row.try_get("shortened").map_err(map_sqlx_error)?;
    let created_at: Option<String> = row.try_get("created_at").map_err(map_sqlx_error)?;
    let visits: i64 = row.try_get("visits").map_err(map_sqlx_error)?;

    let created_at = created_at
        .ok_or_else(|| StorageError::InvalidData(format!("link '{id}' has no created_at")))?;
    let created_at = created_at.parse::<Timestamp>().map_err(|e| {
        StorageError::InvalidData(format!("invalid created_at '{created_at}': {e}"))
    })?;
    let visits = u64::try_from(visits)
        .map_err(|_| StorageError::InvalidData(format!("negative visit count {visits}")))?;

    Ok(Link {
        id: ShortCode::new_unchecked(id),
        original_url,
        shortened: ShortCode::new_unchecked(shortened),
        created_at,
        visits,
    })
}

#[async_trait]
impl LinkRepository for SqliteRepository {
    async fn save(&self, link: Link) -> Result<()> {
        let visits = i64::try_from(link.visits)
            .map_err(|_| StorageError::InvalidData(format!("visit count {} too large", link.visits)))?;

        let insert = sqlx::query(
            r#"
            INSERT INTO links (id, original_url, shortened, created_at, visits)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(link.id.as_str())
        .bind(link.original_url.as_str())
        .bind(link.shortened.as_str())
        .bind(link.created_at.to_string())
        .bind(visits)
        .execute(&self.pool);

        self.run(insert, |err| {
            if is_unique_violation(&err) {
                StorageError::Conflict(link.id.to_string())
            } else {
                map_sqlx_error(err)
            }
        })
        .await?;

        trace!(code = %link.id, "link saved");
        Ok(())
    }

    async fn get_by_code(&self, code: &ShortCode) -> Result<Link> {
        let select = sqlx::query(
            r#"
            SELECT id, original_url, shortened, created_at, visits
            FROM links
            WHERE id = ?
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool);

        let row = self.run(select, map_sqlx_error).await?;
        let Some(row) = row else {
            return Err(StorageError::NotFound(code.to_string()));
        };

        link_from_row(&row)
    }

    async fn increment_visits(&self, code: &ShortCode) -> Result<()> {
        let update = sqlx::query("UPDATE links SET visits = visits + 1 WHERE id = ?")
            .bind(code.as_str())
            .execute(&self.pool);

        let result = self.run(update, map_sqlx_error).await?;
        if result.rows_affected() == 0 {
            trace!(code = %code, "dropping visit for unknown code");
        }

        Ok(())
    }
}
