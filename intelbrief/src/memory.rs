use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Default store location when no database path is configured.
pub const LOCAL_FALLBACK_PATH: &str = "local_memory.db";

/// Persistent memory of processed URLs, backed by a single `seen_news`
/// table. Call volume is tens of rows per run, so every operation opens
/// and closes its own short-lived connection instead of holding a pool.
pub struct NewsMemory {
    path: String,
    options: SqliteConnectOptions,
}

impl NewsMemory {
    /// Build a store over the configured sqlite path, falling back to a
    /// local file when none is configured.
    pub fn new(path: Option<&str>) -> Result<Self> {
        let path = path.unwrap_or(LOCAL_FALLBACK_PATH).to_string();
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))
            .with_context(|| format!("invalid sqlite path: {}", path))?
            .create_if_missing(true);
        Ok(Self { path, options })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        // Ensure the parent directory exists so connect errors surface the
        // actual filesystem problem rather than a generic sqlite failure.
        if let Some(parent) = Path::new(&self.path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("failed to create DB parent directory: {}", parent.display())
                })?;
            }
        }

        let conn = self
            .options
            .clone()
            .connect()
            .await
            .with_context(|| format!("failed to connect to sqlite database at: {}", self.path))?;
        Ok(conn)
    }

    /// Create the `seen_news` table if it does not exist. Idempotent.
    pub async fn init_db(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_news (
                url TEXT PRIMARY KEY,
                title TEXT,
                source TEXT,
                processed_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&mut conn)
        .await
        .context("failed to create seen_news table")?;
        conn.close().await.ok();
        debug!(path = %self.path, "memory store initialized");
        Ok(())
    }

    /// True iff the URL has been processed by a previous run.
    pub async fn is_duplicate(&self, url: &str) -> Result<bool> {
        let mut conn = self.connect().await?;
        let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM seen_news WHERE url = ?")
            .bind(url)
            .fetch_optional(&mut conn)
            .await
            .context("failed to check seen_news")?;
        conn.close().await.ok();
        Ok(row.is_some())
    }

    /// Record one processed item. Insert-only; rows are never updated.
    pub async fn record(&self, url: &str, title: &str, source: &str) -> Result<()> {
        let mut conn = self.connect().await?;
        sqlx::query("INSERT INTO seen_news (url, title, source) VALUES (?, ?, ?)")
            .bind(url)
            .bind(title)
            .bind(source)
            .execute(&mut conn)
            .await
            .context("failed to insert into seen_news")?;
        conn.close().await.ok();
        Ok(())
    }
}
