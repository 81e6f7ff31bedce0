//! Retention sweep: bulk deletion of rows older than a fixed age.

use anyhow::{anyhow, Result};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{info, instrument};

use crate::config::RetentionConfig;
use crate::store::Store;

/// Rows removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub prices_deleted: u64,
    pub headlines_deleted: u64,
    /// Always zero unless the policy includes sentiment labels
    pub labels_deleted: u64,
}

impl SweepSummary {
    pub fn total(&self) -> u64 {
        self.prices_deleted + self.headlines_deleted + self.labels_deleted
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionPolicy {
    max_age_days: i64,
    include_sentiment: bool,
}

impl RetentionPolicy {
    pub fn new(config: RetentionConfig) -> Self {
        Self {
            max_age_days: config.max_age_days,
            include_sentiment: config.include_sentiment,
        }
    }

    /// Cutoff for a sweep run at `now`; rows strictly older are deleted.
    pub fn threshold(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        TimeDelta::try_days(self.max_age_days)
            .and_then(|max_age| now.checked_sub_signed(max_age))
            .ok_or_else(|| anyhow!("Retention age of {} days is out of range", self.max_age_days))
    }

    pub async fn sweep(&self, store: &Store) -> Result<SweepSummary> {
        self.sweep_at(store, Utc::now()).await
    }

    /// Delete stale rows in one transaction, using `now` as the current time.
    #[instrument(skip(self, store))]
    pub async fn sweep_at(&self, store: &Store, now: DateTime<Utc>) -> Result<SweepSummary> {
        let threshold = self.threshold(now)?;
        info!("Maintenance: removing rows older than {}", threshold);

        let mut session = store.begin().await?;
        let mut summary = SweepSummary {
            prices_deleted: session.delete_prices_before(threshold).await?,
            headlines_deleted: session.delete_headlines_before(threshold).await?,
            labels_deleted: 0,
        };
        if self.include_sentiment {
            summary.labels_deleted = session.delete_sentiment_before(threshold).await?;
        }
        session.commit().await?;

        info!(
            "Cleanup done: removed {} price rows, {} news rows, {} sentiment rows",
            summary.prices_deleted, summary.headlines_deleted, summary.labels_deleted
        );
        Ok(summary)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(RetentionConfig::default())
    }
}
