//! Process configuration.
//!
//! Everything is read from environment-style variables. Only `DATABASE_URL`
//! is required; the rest tune the sentiment strategy and the retention sweep.

use anyhow::{anyhow, Context, Result};
use chrono::{TimeDelta, Utc};
use std::time::Duration;

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const MODEL_URL_VAR: &str = "SENTIMENT_MODEL_URL";
pub const MODEL_TOKEN_VAR: &str = "SENTIMENT_MODEL_TOKEN";
pub const MODEL_TIMEOUT_VAR: &str = "SENTIMENT_MODEL_TIMEOUT_SECS";
pub const BULLISH_KEYWORDS_VAR: &str = "BULLISH_KEYWORDS";
pub const BEARISH_KEYWORDS_VAR: &str = "BEARISH_KEYWORDS";
pub const RETENTION_DAYS_VAR: &str = "RETENTION_DAYS";
pub const RETENTION_SENTIMENT_VAR: &str = "RETENTION_INCLUDE_SENTIMENT";

/// Keyword tables and score ranges for the heuristic strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicConfig {
    /// Lower-case substrings that mark a headline bullish (checked first)
    pub bullish_keywords: Vec<String>,
    /// Lower-case substrings that mark a headline bearish
    pub bearish_keywords: Vec<String>,
    /// Score range for bullish and bearish labels
    pub polar_score_range: (f64, f64),
    /// Score for neutral labels
    pub neutral_score: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            bullish_keywords: to_keywords(&["rally", "up", "growth", "breakthrough"]),
            bearish_keywords: to_keywords(&["crash", "down", "drop", "regulations"]),
            polar_score_range: (0.7, 0.9),
            neutral_score: 0.5,
        }
    }
}

/// Connection details for the external text-classification model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub endpoint: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

/// Age threshold and scope of the retention sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionConfig {
    pub max_age_days: i64,
    /// Whether sentiment labels are swept along with prices and headlines
    pub include_sentiment: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_days: 365,
            include_sentiment: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Normalized store connection string
    pub database_url: String,
    /// `None` selects the heuristic strategy
    pub model: Option<ModelConfig>,
    pub heuristic: HeuristicConfig,
    pub retention: RetentionConfig,
}

impl PipelineConfig {
    /// Create a configuration with defaults for everything but the store.
    pub fn new(database_url: &str) -> Self {
        Self {
            database_url: normalize_database_url(database_url),
            model: None,
            heuristic: HeuristicConfig::default(),
            retention: RetentionConfig::default(),
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = get(DATABASE_URL_VAR)
            .ok_or_else(|| anyhow!("{} is not set", DATABASE_URL_VAR))?;
        let mut config = Self::new(&database_url);

        if let Some(endpoint) = get(MODEL_URL_VAR) {
            let timeout_secs = match get(MODEL_TIMEOUT_VAR) {
                Some(raw) => raw
                    .parse::<u64>()
                    .with_context(|| format!("Invalid {}: {}", MODEL_TIMEOUT_VAR, raw))?,
                None => 30,
            };
            config.model = Some(ModelConfig {
                endpoint,
                api_token: get(MODEL_TOKEN_VAR),
                timeout: Duration::from_secs(timeout_secs),
            });
        }

        if let Some(raw) = get(BULLISH_KEYWORDS_VAR) {
            config.heuristic.bullish_keywords = parse_keywords(&raw);
        }
        if let Some(raw) = get(BEARISH_KEYWORDS_VAR) {
            config.heuristic.bearish_keywords = parse_keywords(&raw);
        }

        if let Some(raw) = get(RETENTION_DAYS_VAR) {
            let days = raw
                .parse::<i64>()
                .with_context(|| format!("Invalid {}: {}", RETENTION_DAYS_VAR, raw))?;
            if days <= 0 {
                return Err(anyhow!("{} must be positive, got {}", RETENTION_DAYS_VAR, days));
            }
            let reachable = TimeDelta::try_days(days)
                .and_then(|max_age| Utc::now().checked_sub_signed(max_age))
                .is_some();
            if !reachable {
                return Err(anyhow!("Invalid {}: {} days is out of range", RETENTION_DAYS_VAR, days));
            }
            config.retention.max_age_days = days;
        }
        if let Some(raw) = get(RETENTION_SENTIMENT_VAR) {
            config.retention.include_sentiment = parse_flag(&raw)
                .ok_or_else(|| anyhow!("Invalid {}: {}", RETENTION_SENTIMENT_VAR, raw))?;
        }

        Ok(config)
    }

    /// Use the external model strategy.
    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.model = Some(model);
        self
    }

    /// Replace the heuristic keyword tables.
    pub fn with_heuristic(mut self, heuristic: HeuristicConfig) -> Self {
        self.heuristic = heuristic;
        self
    }

    /// Set the retention policy.
    pub fn with_retention(mut self, retention: RetentionConfig) -> Self {
        self.retention = retention;
        self
    }
}

/// Rewrite the legacy `postgres://` scheme to `postgresql://`.
pub fn normalize_database_url(url: &str) -> String {
    match url.strip_prefix("postgres://") {
        Some(rest) => format!("postgresql://{}", rest),
        None => url.to_string(),
    }
}

fn to_keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|w| w.trim().to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
