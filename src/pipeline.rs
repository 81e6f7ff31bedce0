//! Orchestrator: runs the pipeline steps once, strictly in sequence.
//!
//! Every step opens and releases its own session. A failing step is logged
//! and recorded in the [`PipelineReport`]; later steps still run.

use anyhow::Result;
use std::fmt;
use std::time::Instant;
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::ingest::{ingest_headline, ingest_ticks};
use crate::retention::RetentionPolicy;
use crate::sentiment::{select_strategy, LabelOutcome, SentimentLabeler, SentimentStrategy};
use crate::store::Store;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Ticks,
    Headline,
    Sentiment,
    Retention,
}

impl Step {
    /// Full run order.
    pub const ALL: [Step; 4] = [Step::Ticks, Step::Headline, Step::Sentiment, Step::Retention];
    /// Data collection only.
    pub const INGEST: [Step; 2] = [Step::Ticks, Step::Headline];

    pub fn name(&self) -> &'static str {
        match self {
            Step::Ticks => "stock-ticks",
            Step::Headline => "news-headline",
            Step::Sentiment => "sentiment",
            Step::Retention => "retention-sweep",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Human-readable summary of what the step did
    Completed(String),
    /// Error chain of the failure
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub step: Step,
    pub outcome: StepOutcome,
}

/// Per-step results of one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub steps: Vec<StepReport>,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|report| matches!(report.outcome, StepOutcome::Failed(_)))
    }
}

pub struct Pipeline {
    labeler: SentimentLabeler,
    retention: RetentionPolicy,
}

impl Pipeline {
    pub fn new(strategy: Arc<dyn SentimentStrategy>, retention: RetentionPolicy) -> Self {
        Self {
            labeler: SentimentLabeler::new(strategy),
            retention,
        }
    }

    /// Build the pipeline described by the configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(select_strategy(config), RetentionPolicy::new(config.retention))
    }

    /// Run every step once.
    pub async fn run_once(&self, store: &Store) -> PipelineReport {
        self.run_steps(store, &Step::ALL).await
    }

    /// Run the given steps in order, isolating failures per step.
    pub async fn run_steps(&self, store: &Store, steps: &[Step]) -> PipelineReport {
        info!(
            "Pipeline start ({} steps, {} sentiment)",
            steps.len(),
            self.labeler.strategy_name()
        );
        let mut report = PipelineReport::default();

        for &step in steps {
            let started = Instant::now();
            let outcome = match self.run_step(store, step).await {
                Ok(detail) => {
                    info!("Step {} done in {:?}: {}", step, started.elapsed(), detail);
                    StepOutcome::Completed(detail)
                }
                Err(e) => {
                    error!("Step {} failed: {:#}", step, e);
                    StepOutcome::Failed(format!("{:#}", e))
                }
            };
            report.steps.push(StepReport { step, outcome });
        }

        if report.succeeded() {
            info!("Pipeline finished successfully");
        } else {
            error!(
                "Pipeline finished with {} failed step(s)",
                report.failures().count()
            );
        }
        report
    }

    async fn run_step(&self, store: &Store, step: Step) -> Result<String> {
        match step {
            Step::Ticks => {
                let summary = ingest_ticks(store).await?;
                Ok(format!(
                    "{} price rows written, {} skipped",
                    summary.written,
                    summary.skipped.len()
                ))
            }
            Step::Headline => {
                let headline = ingest_headline(store).await?;
                Ok(format!("headline {} stored", headline.id))
            }
            Step::Sentiment => Ok(match self.labeler.label_latest(store).await? {
                LabelOutcome::NoHeadline => "no headline to label".to_string(),
                LabelOutcome::AlreadyLabeled(_) => "latest headline already labeled".to_string(),
                LabelOutcome::Labeled(label) => {
                    format!("labeled {} ({:.2})", label.label, label.score)
                }
            }),
            Step::Retention => {
                let summary = self.retention.sweep(store).await?;
                Ok(format!("{} stale rows removed", summary.total()))
            }
        }
    }
}
