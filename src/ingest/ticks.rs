//! Market-tick generator.
//!
//! Produces one price sample per allow-listed symbol as base price plus a
//! uniform perturbation in [-2, 2], and writes the batch in one transaction.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::store::{Session, Store};
use crate::types::{NewPriceSample, Ticker, ALLOW_LIST};

/// Maximum absolute deviation from a ticker's base price.
pub const PRICE_JITTER: f64 = 2.0;

/// Result of one tick ingestion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickSummary {
    /// Rows committed
    pub written: usize,
    /// Symbols whose row failed and was left out of the batch
    pub skipped: Vec<String>,
}

/// Simulate one sample per ticker, all stamped `at`.
pub fn simulate_ticks<R: Rng + ?Sized>(
    rng: &mut R,
    tickers: &[Ticker],
    at: DateTime<Utc>,
) -> Vec<NewPriceSample> {
    tickers
        .iter()
        .map(|ticker| NewPriceSample {
            symbol: ticker.symbol.to_string(),
            price: ticker.base_price + rng.gen_range(-PRICE_JITTER..=PRICE_JITTER),
            timestamp: at,
        })
        .collect()
}

/// Simulate and store the current tick for every allow-listed symbol.
#[instrument(skip(store))]
pub async fn ingest_ticks(store: &Store) -> Result<TickSummary> {
    let samples = simulate_ticks(&mut rand::thread_rng(), &ALLOW_LIST, Utc::now());
    write_ticks(store, &samples).await
}

/// Write a batch of samples in one transaction.
///
/// A failing row is rolled back to its savepoint, logged and skipped; the
/// rest of the batch still commits. A failed commit discards the whole batch
/// and is returned to the caller.
pub async fn write_ticks(store: &Store, samples: &[NewPriceSample]) -> Result<TickSummary> {
    let mut session = store.begin().await?;
    let mut summary = TickSummary::default();

    for sample in samples {
        match write_one(&mut session, sample).await {
            Ok(id) => {
                debug!("Stored {} @ {:.2} (id {})", sample.symbol, sample.price, id);
                summary.written += 1;
            }
            Err(e) => {
                warn!("Skipping price sample for {}: {:#}", sample.symbol, e);
                summary.skipped.push(sample.symbol.clone());
            }
        }
    }

    session.commit().await?;

    info!(
        "Stock data ingested: {} rows, {} skipped",
        summary.written,
        summary.skipped.len()
    );
    Ok(summary)
}

async fn write_one(session: &mut Session<'_>, sample: &NewPriceSample) -> Result<i64> {
    let mut savepoint = session.savepoint().await?;
    match savepoint.insert_price(sample).await {
        Ok(id) => {
            savepoint.commit().await?;
            Ok(id)
        }
        Err(e) => {
            savepoint.rollback().await?;
            Err(e)
        }
    }
}
