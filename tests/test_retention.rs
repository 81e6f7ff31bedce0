//! Retention sweep boundaries against a real SQLite store.

mod common;

use chrono::{Duration, Utc};
use common::{add_headline, temp_store};
use market_pulse::config::RetentionConfig;
use market_pulse::retention::RetentionPolicy;
use market_pulse::types::{NewPriceSample, NewSentimentLabel};
use market_pulse::{SentimentKind, Store};

async fn seed(store: &Store) {
    let now = Utc::now();
    let mut session = store.begin().await.unwrap();
    for (symbol, age_days) in [("AAPL", 400), ("AAPL", 30), ("TSLA", 366), ("TSLA", 1)] {
        session
            .insert_price(&NewPriceSample {
                symbol: symbol.to_string(),
                price: 150.0,
                timestamp: now - Duration::days(age_days),
            })
            .await
            .unwrap();
    }
    for age_days in [400, 30] {
        session
            .insert_sentiment(&NewSentimentLabel {
                symbol: "MARKET".to_string(),
                score: 0.5,
                label: SentimentKind::Neutral,
                headline: format!("Headline from {} days ago", age_days),
                timestamp: now - Duration::days(age_days),
            })
            .await
            .unwrap();
    }
    session.commit().await.unwrap();

    add_headline(store, "Old news", now - Duration::days(400)).await;
    add_headline(store, "Fresh news", now - Duration::days(30)).await;
}

#[tokio::test]
async fn test_sweep_removes_only_stale_rows() {
    let (_dir, store) = temp_store().await;
    seed(&store).await;

    let summary = RetentionPolicy::default().sweep(&store).await.unwrap();

    assert_eq!(summary.prices_deleted, 2);
    assert_eq!(summary.headlines_deleted, 1);
    assert_eq!(summary.labels_deleted, 0);

    let news = store.news_feed(10).await.unwrap();
    assert_eq!(news.len(), 1);
    assert_eq!(news[0].headline, "Fresh news");

    // Sentiment rows are kept by default, however old
    let counts = store.counts().await.unwrap();
    assert_eq!(counts.price_samples, 2);
    assert_eq!(counts.sentiment_labels, 2);
}

#[tokio::test]
async fn test_sweep_can_include_sentiment() {
    let (_dir, store) = temp_store().await;
    seed(&store).await;
    let policy = RetentionPolicy::new(RetentionConfig {
        max_age_days: 365,
        include_sentiment: true,
    });

    let summary = policy.sweep(&store).await.unwrap();

    assert_eq!(summary.labels_deleted, 1);
    let labels = store.latest_sentiment(10).await.unwrap();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].headline, "Headline from 30 days ago");
}

#[tokio::test]
async fn test_sweep_on_empty_store() {
    let (_dir, store) = temp_store().await;

    let summary = RetentionPolicy::default().sweep(&store).await.unwrap();

    assert_eq!(summary.total(), 0);
}

#[tokio::test]
async fn test_row_exactly_at_threshold_is_kept() {
    let (_dir, store) = temp_store().await;
    let now = Utc::now();
    let policy = RetentionPolicy::default();
    let threshold = policy.threshold(now).unwrap();

    let mut session = store.begin().await.unwrap();
    session
        .insert_price(&NewPriceSample {
            symbol: "MSFT".to_string(),
            price: 300.0,
            timestamp: threshold,
        })
        .await
        .unwrap();
    session
        .insert_price(&NewPriceSample {
            symbol: "MSFT".to_string(),
            price: 301.0,
            timestamp: threshold - Duration::milliseconds(1),
        })
        .await
        .unwrap();
    session.commit().await.unwrap();

    let summary = policy.sweep_at(&store, now).await.unwrap();

    assert_eq!(summary.prices_deleted, 1);
    let remaining = store.price_history("MSFT", 10).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].price, 300.0);
}
