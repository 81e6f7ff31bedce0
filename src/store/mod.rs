//! Store adapter for the pipeline's relational database.
//!
//! `Store` owns the process-wide connection pool and is constructed once at
//! startup, then handed to each pipeline step. Writes go through a scoped
//! [`Session`] (one database transaction); reads for reporting go straight
//! to the pool.

pub mod schema;
pub mod session;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, FromRow};
use tracing::{debug, info};

use crate::config::normalize_database_url;
use crate::types::{Headline, PriceSample, SentimentLabel, TableCounts};

pub use session::Session;

/// Database engine behind a connection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    /// Detect the backend from a (normalized) connection string.
    pub fn from_url(url: &str) -> Result<Self> {
        if url.starts_with("postgresql://") || url.starts_with("postgres://") {
            Ok(Backend::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else {
            let scheme = url.split(':').next().unwrap_or_default();
            Err(anyhow!("Unsupported database scheme: {}", scheme))
        }
    }

    fn schema(&self) -> &'static [&'static str] {
        match self {
            Backend::Postgres => schema::POSTGRES_SCHEMA,
            Backend::Sqlite => schema::SQLITE_SCHEMA,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct PriceRow {
    id: i64,
    symbol: String,
    price: f64,
    timestamp_ms: i64,
}

#[derive(FromRow)]
pub(crate) struct HeadlineRow {
    id: i64,
    headline: String,
    url: String,
    source: String,
    summary: Option<String>,
    published_at_ms: i64,
}

#[derive(FromRow)]
pub(crate) struct SentimentRow {
    id: i64,
    symbol: String,
    score: f64,
    label: String,
    headline: String,
    timestamp_ms: i64,
}

impl TryFrom<PriceRow> for PriceSample {
    type Error = anyhow::Error;

    fn try_from(row: PriceRow) -> Result<Self> {
        Ok(PriceSample {
            id: row.id,
            symbol: row.symbol,
            price: row.price,
            timestamp: from_millis(row.timestamp_ms)?,
        })
    }
}

impl TryFrom<HeadlineRow> for Headline {
    type Error = anyhow::Error;

    fn try_from(row: HeadlineRow) -> Result<Self> {
        Ok(Headline {
            id: row.id,
            headline: row.headline,
            url: row.url,
            source: row.source,
            summary: row.summary,
            published_at: from_millis(row.published_at_ms)?,
        })
    }
}

impl TryFrom<SentimentRow> for SentimentLabel {
    type Error = anyhow::Error;

    fn try_from(row: SentimentRow) -> Result<Self> {
        Ok(SentimentLabel {
            id: row.id,
            symbol: row.symbol,
            score: row.score,
            label: row.label.parse()?,
            headline: row.headline,
            timestamp: from_millis(row.timestamp_ms)?,
        })
    }
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| anyhow!("Timestamp out of range: {} ms", ms))
}

fn convert_rows<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = anyhow::Error>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Handle to the pipeline database.
pub struct Store {
    pool: AnyPool,
    backend: Backend,
}

impl Store {
    /// Connect to the database and create any missing tables.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let url = normalize_database_url(database_url);
        let backend = Backend::from_url(&url)?;

        sqlx::any::install_default_drivers();

        // Every pooled connection to an in-memory SQLite database is a separate database
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool, backend };
        store.migrate().await?;

        info!("Store initialized ({:?} backend)", backend);
        Ok(store)
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        for statement in self.backend.schema() {
            sqlx::query(*statement)
                .execute(&self.pool)
                .await
                .context("Failed to apply schema")?;
        }
        debug!("Schema applied");
        Ok(())
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Open a scoped session. Dropping it without [`Session::commit`] rolls back.
    pub async fn begin(&self) -> Result<Session<'static>> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        Ok(Session::new(tx))
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Store closed");
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    // Read model

    /// Most recent price samples across all symbols, newest first.
    pub async fn latest_prices(&self, limit: i64) -> Result<Vec<PriceSample>> {
        let rows: Vec<PriceRow> = sqlx::query_as(
            r#"
            SELECT id, symbol, price, timestamp_ms FROM stock_data
            ORDER BY timestamp_ms DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch latest prices")?;

        convert_rows(rows)
    }

    /// Price history for one symbol, newest first.
    pub async fn price_history(&self, symbol: &str, limit: i64) -> Result<Vec<PriceSample>> {
        let rows: Vec<PriceRow> = sqlx::query_as(
            r#"
            SELECT id, symbol, price, timestamp_ms FROM stock_data
            WHERE symbol = $1
            ORDER BY timestamp_ms DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(symbol)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to fetch price history for {}", symbol))?;

        convert_rows(rows)
    }

    /// Most recent sentiment labels, newest first.
    pub async fn latest_sentiment(&self, limit: i64) -> Result<Vec<SentimentLabel>> {
        let rows: Vec<SentimentRow> = sqlx::query_as(
            r#"
            SELECT id, symbol, score, label, headline, timestamp_ms FROM sentiment_data
            ORDER BY timestamp_ms DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch latest sentiment")?;

        convert_rows(rows)
    }

    /// Most recent headlines, newest first.
    pub async fn news_feed(&self, limit: i64) -> Result<Vec<Headline>> {
        let rows: Vec<HeadlineRow> = sqlx::query_as(
            r#"
            SELECT id, headline, url, source, summary, published_at_ms FROM news_feed
            ORDER BY published_at_ms DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch news feed")?;

        convert_rows(rows)
    }

    pub async fn counts(&self) -> Result<TableCounts> {
        Ok(TableCounts {
            price_samples: self.count_rows("stock_data").await?,
            headlines: self.count_rows("news_feed").await?,
            sentiment_labels: self.count_rows("sentiment_data").await?,
        })
    }

    async fn count_rows(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let (count,): (i64,) = sqlx::query_as(&sql)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count rows in {}", table))?;
        Ok(count)
    }
}
