//! Sentiment labeling.
//!
//! A [`SentimentStrategy`] turns headline text into a label and a confidence
//! score. Two strategies exist: a keyword heuristic and an external
//! text-classification model that falls back to the heuristic whenever the
//! model call fails. The strategy is chosen once at startup by
//! [`select_strategy`] and stays fixed for the process lifetime.

pub mod heuristic;
pub mod labeler;
pub mod model;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::types::{SentimentKind, ALLOW_LIST, MARKET_SYMBOL};

pub use heuristic::HeuristicStrategy;
pub use labeler::{LabelOutcome, SentimentLabeler};
pub use model::{HttpClassifier, ModelPrediction, ModelStrategy, TextClassifier};

/// Which path produced an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssessmentOrigin {
    Heuristic,
    Model,
    /// The model failed and the heuristic answered instead
    Fallback,
}

/// Label and confidence for one headline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub label: SentimentKind,
    pub score: f64,
    pub origin: AssessmentOrigin,
}

/// Maps headline text to a sentiment assessment. Implementations never fail.
#[async_trait]
pub trait SentimentStrategy: Send + Sync {
    async fn assess(&self, headline: &str) -> Assessment;

    fn name(&self) -> &'static str;
}

/// First allow-listed ticker contained in the headline, else `MARKET`.
pub fn extract_symbol(headline: &str) -> &'static str {
    ALLOW_LIST
        .iter()
        .map(|ticker| ticker.symbol)
        .find(|symbol| headline.contains(symbol))
        .unwrap_or(MARKET_SYMBOL)
}

/// Build the strategy described by the configuration.
///
/// A model endpoint selects the model strategy; if its HTTP client cannot be
/// built the heuristic is used for the whole run.
pub fn select_strategy(config: &PipelineConfig) -> Arc<dyn SentimentStrategy> {
    let heuristic = HeuristicStrategy::new(config.heuristic.clone());

    let strategy: Arc<dyn SentimentStrategy> = match &config.model {
        Some(model_config) => match HttpClassifier::new(model_config) {
            Ok(classifier) => Arc::new(ModelStrategy::new(Arc::new(classifier), heuristic)),
            Err(e) => {
                warn!("Could not set up sentiment model ({:#}). Using heuristic.", e);
                Arc::new(heuristic)
            }
        },
        None => Arc::new(heuristic),
    };

    info!("Sentiment strategy: {}", strategy.name());
    strategy
}
