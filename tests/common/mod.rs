//! Shared helpers for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use market_pulse::ingest::{write_headline, HEADLINE_URL};
use market_pulse::types::NewHeadline;
use market_pulse::Store;
use tempfile::TempDir;

/// A store backed by a SQLite file inside a temporary directory.
///
/// The directory is removed when the returned `TempDir` is dropped, so keep
/// it alive for the duration of the test.
pub async fn temp_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = database_url(&dir);
    let store = Store::connect(&url).await.expect("Failed to open store");
    (dir, store)
}

pub fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join("pulse.db").display())
}

pub async fn add_headline(store: &Store, text: &str, at: DateTime<Utc>) -> i64 {
    let headline = NewHeadline {
        headline: text.to_string(),
        url: HEADLINE_URL.to_string(),
        source: "Reuters".to_string(),
        summary: None,
        published_at: at,
    };
    write_headline(store, &headline)
        .await
        .expect("Failed to insert headline")
}
