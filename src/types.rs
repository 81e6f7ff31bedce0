//! Core record types for the MarketPulse pipeline.
//!
//! Three independent record kinds live in the store: simulated price
//! samples, news headlines and the sentiment labels derived from them.
//! `New*` variants are the insert shapes (no database id yet).

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A ticker on the fixed allow-list together with its simulation base price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ticker {
    pub symbol: &'static str,
    pub base_price: f64,
}

/// The fixed allow-list, in the order used for symbol extraction.
pub const ALLOW_LIST: [Ticker; 4] = [
    Ticker { symbol: "AAPL", base_price: 150.0 },
    Ticker { symbol: "TSLA", base_price: 200.0 },
    Ticker { symbol: "MSFT", base_price: 300.0 },
    Ticker { symbol: "NVDA", base_price: 400.0 },
];

/// Symbol recorded on a sentiment label when no allow-listed ticker matches.
pub const MARKET_SYMBOL: &str = "MARKET";

/// Coarse sentiment classes stored on a label row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentKind {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentKind::Bullish => "bullish",
            SentimentKind::Bearish => "bearish",
            SentimentKind::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bullish" => Ok(SentimentKind::Bullish),
            "bearish" => Ok(SentimentKind::Bearish),
            "neutral" => Ok(SentimentKind::Neutral),
            other => Err(anyhow!("Unknown sentiment label: {}", other)),
        }
    }
}

/// A simulated price tick (`stock_data` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub id: i64,
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPriceSample {
    pub symbol: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

/// A news headline (`news_feed` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub id: i64,
    pub headline: String,
    pub url: String,
    pub source: String,
    /// Optional summary; the generator never fills it in
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewHeadline {
    pub headline: String,
    pub url: String,
    pub source: String,
    pub summary: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// A sentiment label derived from one headline (`sentiment_data` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentLabel {
    pub id: i64,
    /// Allow-listed ticker found in the headline, or `MARKET`
    pub symbol: String,
    /// Confidence in [0, 1]
    pub score: f64,
    pub label: SentimentKind,
    /// Exact text of the source headline; doubles as the dedup key
    pub headline: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSentimentLabel {
    pub symbol: String,
    pub score: f64,
    pub label: SentimentKind,
    pub headline: String,
    pub timestamp: DateTime<Utc>,
}

/// Row counts per table, used by reports and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub price_samples: i64,
    pub headlines: i64,
    pub sentiment_labels: i64,
}
