//! External text-classification model strategy.
//!
//! The model is reached over HTTP using the Hugging Face inference request
//! shape: `POST {"inputs": "<text>"}` answered by a list of
//! `{label, score}` pairs (optionally nested one level). The highest-scoring
//! label wins. Any failure is absorbed by [`ModelStrategy`], which answers
//! with the heuristic instead.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{Assessment, AssessmentOrigin, HeuristicStrategy, SentimentStrategy};
use crate::config::ModelConfig;
use crate::types::SentimentKind;

/// Raw three-class output of a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrediction {
    /// Model label, expected to be one of positive/negative/neutral
    pub label: String,
    pub confidence: f64,
}

/// Opaque classification boundary: text in, label and confidence out.
#[async_trait]
pub trait TextClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ModelPrediction>;
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct ScoredLabel {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<ScoredLabel>>),
    Flat(Vec<ScoredLabel>),
}

/// Classifier backed by an HTTP inference endpoint.
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl HttpClassifier {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl TextClassifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<ModelPrediction> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&InferenceRequest { inputs: text });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("Sentiment model request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Sentiment model returned HTTP {}: {}", status, body));
        }

        let body: InferenceResponse = response
            .json()
            .await
            .context("Malformed sentiment model response")?;

        let prediction = top_prediction(body)?;
        debug!("Model predicted {} ({:.3})", prediction.label, prediction.confidence);
        Ok(prediction)
    }
}

fn top_prediction(response: InferenceResponse) -> Result<ModelPrediction> {
    let candidates = match response {
        InferenceResponse::Nested(batches) => batches.into_iter().flatten().collect(),
        InferenceResponse::Flat(labels) => labels,
    };

    candidates
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|best| ModelPrediction {
            label: best.label,
            confidence: best.score,
        })
        .ok_or_else(|| anyhow!("Sentiment model returned no labels"))
}

/// Map the model's three classes onto market sentiment.
pub fn map_model_label(label: &str) -> SentimentKind {
    match label.to_ascii_lowercase().as_str() {
        "positive" => SentimentKind::Bullish,
        "negative" => SentimentKind::Bearish,
        _ => SentimentKind::Neutral,
    }
}

fn validate(prediction: ModelPrediction) -> Result<ModelPrediction> {
    if prediction.confidence.is_finite() && (0.0..=1.0).contains(&prediction.confidence) {
        Ok(prediction)
    } else {
        Err(anyhow!(
            "Model confidence out of range: {}",
            prediction.confidence
        ))
    }
}

/// Model-first strategy with a per-call heuristic fallback.
pub struct ModelStrategy {
    classifier: Arc<dyn TextClassifier>,
    fallback: HeuristicStrategy,
}

impl ModelStrategy {
    pub fn new(classifier: Arc<dyn TextClassifier>, fallback: HeuristicStrategy) -> Self {
        Self { classifier, fallback }
    }
}

#[async_trait]
impl SentimentStrategy for ModelStrategy {
    async fn assess(&self, headline: &str) -> Assessment {
        match self.classifier.classify(headline).await.and_then(validate) {
            Ok(prediction) => Assessment {
                label: map_model_label(&prediction.label),
                score: prediction.confidence,
                origin: AssessmentOrigin::Model,
            },
            Err(e) => {
                warn!("Inference error, falling back to heuristic: {:#}", e);
                let assessment = self.fallback.assess(headline).await;
                Assessment {
                    origin: AssessmentOrigin::Fallback,
                    ..assessment
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "model"
    }
}
