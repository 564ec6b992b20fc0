use async_trait::async_trait;
use jiff::Timestamp;
use linksnip_core::error::StorageError;
use linksnip_core::page::{Page, PageRequest};
use linksnip_core::repository::{LinkRecord, ReadRepository, Repository, Result};
use linksnip_core::shortcode::ShortCode;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, trace};

const SCHEMA: &str = include_str!("../ddl/sqlite/links.sql");
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_CONNECTIONS: u32 = 8;

const SELECT_COLUMNS: &str = "code, target_url, is_custom, created_at, expires_at, click_count";

/// SQLite implementation of the repository contract.
///
/// Records survive restarts. Uniqueness is enforced by the primary key on
/// `code`; `put_if_absent` is a single upsert that only overwrites a row
/// whose expiry has passed, so the check and the write cannot interleave
/// with another writer. Expired rows are never returned by reads.
///
/// The database must be a file: every pooled connection to `:memory:` would
/// see its own empty database.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Creates a repository from an existing pool. Call [`migrate`](Self::migrate)
    /// before use if the schema may be missing.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at a `sqlite://` URL and
    /// applies the schema.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url).map_err(map_sqlx_error)?;
        Self::connect_with(options).await
    }

    /// Opens (creating if needed) the database file at `path` and applies
    /// the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(path);
        Self::connect_with(options).await
    }

    async fn connect_with(options: SqliteConnectOptions) -> Result<Self> {
        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await
            .map_err(map_sqlx_error)?;

        let repository = Self::new(pool);
        repository.migrate().await?;
        Ok(repository)
    }

    /// Creates the `links` table and its index if they do not exist.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        debug!("sqlite schema is up to date");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes every pooled connection, flushing the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn now_unix_millis() -> i64 {
    Timestamp::now().as_millisecond()
}

fn parse_timestamp(column: &str, millis: i64) -> Result<Timestamp> {
    Timestamp::from_millisecond(millis).map_err(|e| {
        StorageError::InvalidData(format!("invalid {column} timestamp '{millis}': {e}"))
    })
}

fn record_from_row(row: &SqliteRow) -> Result<LinkRecord> {
    let code: String = row.try_get("code").map_err(map_sqlx_error)?;
    let target_url: String = row.try_get("target_url").map_err(map_sqlx_error)?;
    let is_custom: bool = row.try_get("is_custom").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expires_at: Option<i64> = row.try_get("expires_at").map_err(map_sqlx_error)?;
    let click_count: i64 = row.try_get("click_count").map_err(map_sqlx_error)?;

    Ok(LinkRecord {
        code: ShortCode::new_unchecked(code),
        target_url,
        is_custom,
        created_at: parse_timestamp("created_at", created_at)?,
        expires_at: expires_at
            .map(|millis| parse_timestamp("expires_at", millis))
            .transpose()?,
        click_count: u64::try_from(click_count).map_err(|_| {
            StorageError::InvalidData(format!("negative click_count: {click_count}"))
        })?,
    })
}

fn is_busy(err: &sqlx::Error) -> bool {
    // SQLITE_BUSY and SQLITE_BUSY_SNAPSHOT
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "5" || code == "517")
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    if is_busy(&err) {
        return StorageError::Timeout(message);
    }

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Configuration(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadRepository for SqliteRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        trace!(code = %code, "fetching link from sqlite");

        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM links \
             WHERE code = ? AND (expires_at IS NULL OR expires_at > ?)"
        ))
        .bind(code.as_str())
        .bind(now_unix_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM links
            WHERE code = ?
              AND (expires_at IS NULL OR expires_at > ?)
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .bind(now_unix_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }

    async fn list(&self, request: PageRequest) -> Result<Page<LinkRecord>> {
        let now = now_unix_millis();
        let offset = i64::try_from(request.offset())
            .map_err(|_| StorageError::Query("page offset out of range".to_string()))?;

        // one read transaction so the count and the page see the same snapshot
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM links WHERE expires_at IS NULL OR expires_at > ?",
        )
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM links \
             WHERE expires_at IS NULL OR expires_at > ? \
             ORDER BY created_at DESC, code ASC \
             LIMIT ? OFFSET ?"
        ))
        .bind(now)
        .bind(i64::from(request.limit()))
        .bind(offset)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        let items = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>>>()?;
        let total = u64::try_from(total).unwrap_or_default();

        Ok(Page::new(items, total, request))
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn put_if_absent(&self, record: LinkRecord) -> Result<()> {
        let click_count = i64::try_from(record.click_count).map_err(|_| {
            StorageError::InvalidData(format!("click_count too large: {}", record.click_count))
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO links (code, target_url, is_custom, created_at, expires_at, click_count)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(code) DO UPDATE SET
                target_url = excluded.target_url,
                is_custom = excluded.is_custom,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at,
                click_count = excluded.click_count
            WHERE links.expires_at IS NOT NULL AND links.expires_at <= ?
            "#,
        )
        .bind(record.code.as_str())
        .bind(record.target_url.as_str())
        .bind(record.is_custom)
        .bind(record.created_at.as_millisecond())
        .bind(record.expires_at.map(|ts| ts.as_millisecond()))
        .bind(click_count)
        .bind(now_unix_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        // the upsert's WHERE skips live rows, leaving nothing affected
        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict(record.code.to_string()));
        }

        Ok(())
    }

    async fn delete(&self, code: &ShortCode) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM links
            WHERE code = ?
              AND (expires_at IS NULL OR expires_at > ?)
            "#,
        )
        .bind(code.as_str())
        .bind(now_unix_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn expire(&self, code: &ShortCode) -> Result<bool> {
        let now = now_unix_millis();

        let result = sqlx::query(
            r#"
            UPDATE links
            SET expires_at = ?
            WHERE code = ?
              AND (expires_at IS NULL OR expires_at > ?)
            "#,
        )
        .bind(now)
        .bind(code.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_click(&self, code: &ShortCode) -> Result<Option<LinkRecord>> {
        let row = sqlx::query(&format!(
            "UPDATE links SET click_count = click_count + 1 \
             WHERE code = ? AND (expires_at IS NULL OR expires_at > ?) \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(code.as_str())
        .bind(now_unix_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }
}
