//! Scoped database session.
//!
//! A `Session` wraps one transaction. It is consumed by [`Session::commit`]
//! or [`Session::rollback`]; if it is dropped on any other path (an early
//! `?` return, a panic unwinding the step) the transaction is rolled back and
//! the connection returns to the pool.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Any, Transaction};
use tracing::debug;

use super::{to_millis, HeadlineRow};
use crate::types::{Headline, NewHeadline, NewPriceSample, NewSentimentLabel};

pub struct Session<'c> {
    tx: Transaction<'c, Any>,
}

impl<'c> Session<'c> {
    pub(crate) fn new(tx: Transaction<'c, Any>) -> Self {
        Self { tx }
    }

    /// Open a nested session backed by a savepoint.
    ///
    /// Rolling the nested session back undoes only its own writes and leaves
    /// the enclosing transaction usable.
    pub async fn savepoint(&mut self) -> Result<Session<'_>> {
        let tx = sqlx::Connection::begin(&mut *self.tx)
            .await
            .context("Failed to open savepoint")?;
        Ok(Session { tx })
    }

    pub async fn commit(self) -> Result<()> {
        self.tx.commit().await.context("Failed to commit transaction")
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .context("Failed to roll back transaction")
    }

    pub async fn insert_price(&mut self, sample: &NewPriceSample) -> Result<i64> {
        debug!("Inserting price sample for {}", sample.symbol);

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO stock_data (symbol, price, timestamp_ms)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(sample.symbol.as_str())
        .bind(sample.price)
        .bind(to_millis(sample.timestamp))
        .fetch_one(&mut *self.tx)
        .await
        .with_context(|| format!("Failed to insert price sample for {}", sample.symbol))?;

        Ok(id)
    }

    pub async fn insert_headline(&mut self, headline: &NewHeadline) -> Result<i64> {
        debug!("Inserting headline: {}", headline.headline);

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO news_feed (headline, url, source, summary, published_at_ms)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(headline.headline.as_str())
        .bind(headline.url.as_str())
        .bind(headline.source.as_str())
        .bind(headline.summary.clone())
        .bind(to_millis(headline.published_at))
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to insert headline")?;

        Ok(id)
    }

    pub async fn insert_sentiment(&mut self, label: &NewSentimentLabel) -> Result<i64> {
        debug!("Inserting {} label for {}", label.label, label.symbol);

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO sentiment_data (symbol, score, label, headline, timestamp_ms)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(label.symbol.as_str())
        .bind(label.score)
        .bind(label.label.as_str())
        .bind(label.headline.as_str())
        .bind(to_millis(label.timestamp))
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to insert sentiment label")?;

        Ok(id)
    }

    /// The most recently published headline; ties go to the latest insert.
    pub async fn latest_headline(&mut self) -> Result<Option<Headline>> {
        let row: Option<HeadlineRow> = sqlx::query_as(
            r#"
            SELECT id, headline, url, source, summary, published_at_ms FROM news_feed
            ORDER BY published_at_ms DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch latest headline")?;

        row.map(Headline::try_from).transpose()
    }

    /// Whether a sentiment label exists for exactly this headline text.
    pub async fn has_sentiment_for(&mut self, headline: &str) -> Result<bool> {
        let existing: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM sentiment_data WHERE headline = $1 LIMIT 1")
                .bind(headline)
                .fetch_optional(&mut *self.tx)
                .await
                .context("Failed to look up existing sentiment")?;

        Ok(existing.is_some())
    }

    pub async fn delete_prices_before(&mut self, threshold: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM stock_data WHERE timestamp_ms < $1")
            .bind(to_millis(threshold))
            .execute(&mut *self.tx)
            .await
            .context("Failed to delete old price samples")?;
        Ok(result.rows_affected())
    }

    pub async fn delete_headlines_before(&mut self, threshold: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM news_feed WHERE published_at_ms < $1")
            .bind(to_millis(threshold))
            .execute(&mut *self.tx)
            .await
            .context("Failed to delete old headlines")?;
        Ok(result.rows_affected())
    }

    pub async fn delete_sentiment_before(&mut self, threshold: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sentiment_data WHERE timestamp_ms < $1")
            .bind(to_millis(threshold))
            .execute(&mut *self.tx)
            .await
            .context("Failed to delete old sentiment labels")?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use chrono::Duration;

    fn headline(text: &str, published_at: DateTime<Utc>) -> NewHeadline {
        NewHeadline {
            headline: text.to_string(),
            url: "https://example.com".to_string(),
            source: "Test Wire".to_string(),
            summary: None,
            published_at,
        }
    }

    #[tokio::test]
    async fn test_dropped_session_rolls_back() {
        let store = Store::connect("sqlite::memory:").await.unwrap();

        {
            let mut session = store.begin().await.unwrap();
            session.insert_headline(&headline("never committed", Utc::now())).await.unwrap();
        }

        assert_eq!(store.counts().await.unwrap().headlines, 0);
    }

    #[tokio::test]
    async fn test_savepoint_rollback_keeps_outer_writes() {
        let store = Store::connect("sqlite::memory:").await.unwrap();
        let mut session = store.begin().await.unwrap();

        session.insert_headline(&headline("kept", Utc::now())).await.unwrap();
        {
            let mut nested = session.savepoint().await.unwrap();
            nested.insert_headline(&headline("discarded", Utc::now())).await.unwrap();
            nested.rollback().await.unwrap();
        }
        session.commit().await.unwrap();

        let feed = store.news_feed(10).await.unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].headline, "kept");
    }

    #[tokio::test]
    async fn test_latest_headline_prefers_newest_then_latest_insert() {
        let store = Store::connect("sqlite::memory:").await.unwrap();
        let now = Utc::now();

        let mut session = store.begin().await.unwrap();
        session.insert_headline(&headline("older", now - Duration::minutes(5))).await.unwrap();
        session.insert_headline(&headline("first at now", now)).await.unwrap();
        session.insert_headline(&headline("second at now", now)).await.unwrap();

        let latest = session.latest_headline().await.unwrap().expect("a headline");
        assert_eq!(latest.headline, "second at now");
        assert_eq!(latest.summary, None);
        session.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_sentiment_lookup_is_exact_match() {
        let store = Store::connect("sqlite::memory:").await.unwrap();
        let mut session = store.begin().await.unwrap();

        session
            .insert_sentiment(&NewSentimentLabel {
                symbol: "MARKET".to_string(),
                score: 0.5,
                label: crate::types::SentimentKind::Neutral,
                headline: "Fed pause".to_string(),
                timestamp: Utc::now(),
            })
            .await
            .unwrap();

        assert!(session.has_sentiment_for("Fed pause").await.unwrap());
        assert!(!session.has_sentiment_for("fed pause").await.unwrap());
        assert!(!session.has_sentiment_for("Fed pause ").await.unwrap());
    }
}
