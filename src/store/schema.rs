//! Table definitions for each supported backend.
//!
//! Timestamps are stored as UTC epoch milliseconds (`BIGINT`/`INTEGER`) so
//! the generic driver can read them back identically on every backend.

pub const POSTGRES_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS stock_data (
        id BIGSERIAL PRIMARY KEY,
        symbol TEXT NOT NULL,
        price DOUBLE PRECISION NOT NULL,
        timestamp_ms BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS news_feed (
        id BIGSERIAL PRIMARY KEY,
        headline TEXT NOT NULL,
        url TEXT NOT NULL,
        source TEXT NOT NULL,
        summary TEXT,
        published_at_ms BIGINT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sentiment_data (
        id BIGSERIAL PRIMARY KEY,
        symbol TEXT NOT NULL,
        score DOUBLE PRECISION NOT NULL,
        label TEXT NOT NULL,
        headline TEXT NOT NULL,
        timestamp_ms BIGINT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_stock_data_symbol_ts ON stock_data (symbol, timestamp_ms)",
    "CREATE INDEX IF NOT EXISTS idx_news_feed_published ON news_feed (published_at_ms)",
    "CREATE INDEX IF NOT EXISTS idx_sentiment_data_headline ON sentiment_data (headline)",
];

pub const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS stock_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        symbol TEXT NOT NULL,
        price REAL NOT NULL,
        timestamp_ms INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS news_feed (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        headline TEXT NOT NULL,
        url TEXT NOT NULL,
        source TEXT NOT NULL,
        summary TEXT,
        published_at_ms INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sentiment_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        symbol TEXT NOT NULL,
        score REAL NOT NULL,
        label TEXT NOT NULL,
        headline TEXT NOT NULL,
        timestamp_ms INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_stock_data_symbol_ts ON stock_data (symbol, timestamp_ms)",
    "CREATE INDEX IF NOT EXISTS idx_news_feed_published ON news_feed (published_at_ms)",
    "CREATE INDEX IF NOT EXISTS idx_sentiment_data_headline ON sentiment_data (headline)",
];
