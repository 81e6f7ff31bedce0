//! Labels the newest headline, at most once per distinct headline text.

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use super::{extract_symbol, SentimentStrategy};
use crate::store::Store;
use crate::types::{NewSentimentLabel, SentimentLabel};

/// What one labeler run did.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelOutcome {
    /// The news feed is empty
    NoHeadline,
    /// The newest headline text already has a label
    AlreadyLabeled(String),
    Labeled(SentimentLabel),
}

pub struct SentimentLabeler {
    strategy: Arc<dyn SentimentStrategy>,
}

impl SentimentLabeler {
    pub fn new(strategy: Arc<dyn SentimentStrategy>) -> Self {
        Self { strategy }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Label the most recently published headline.
    ///
    /// Only the newest headline is considered; older unlabeled headlines are
    /// not revisited. The lookup and the insert run in separate sessions so
    /// no transaction stays open during classification. The existence check
    /// and the insert are therefore not atomic, and concurrent runs may write
    /// duplicate labels.
    #[instrument(skip_all)]
    pub async fn label_latest(&self, store: &Store) -> Result<LabelOutcome> {
        let mut session = store.begin().await?;
        let latest = session.latest_headline().await?;
        let already_labeled = match &latest {
            Some(headline) => session.has_sentiment_for(&headline.headline).await?,
            None => false,
        };
        session.rollback().await?;

        let Some(latest) = latest else {
            info!("No news to analyze");
            return Ok(LabelOutcome::NoHeadline);
        };
        if already_labeled {
            info!("Sentiment already exists for: {}", latest.headline);
            return Ok(LabelOutcome::AlreadyLabeled(latest.headline));
        }

        let symbol = extract_symbol(&latest.headline);
        let assessment = self.strategy.assess(&latest.headline).await;

        let new = NewSentimentLabel {
            symbol: symbol.to_string(),
            score: assessment.score,
            label: assessment.label,
            headline: latest.headline,
            timestamp: Utc::now(),
        };
        let mut session = store.begin().await?;
        let id = session.insert_sentiment(&new).await?;
        session.commit().await?;

        info!(
            "Analyzed: {} ({:.2}, {:?}) for {} [{}]",
            new.label, new.score, assessment.origin, new.headline, new.symbol
        );

        Ok(LabelOutcome::Labeled(SentimentLabel {
            id,
            symbol: new.symbol,
            score: new.score,
            label: new.label,
            headline: new.headline,
            timestamp: new.timestamp,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{write_headline, HEADLINE_URL};
    use crate::sentiment::{Assessment, AssessmentOrigin};
    use crate::types::{NewHeadline, SentimentKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Strategy that opens its own session while classifying. On a
    /// single-connection store this only succeeds if the labeler has
    /// released its connection.
    struct ConnectionCheckingStrategy {
        store: Arc<Store>,
        connection_free: AtomicBool,
    }

    #[async_trait]
    impl SentimentStrategy for ConnectionCheckingStrategy {
        async fn assess(&self, _headline: &str) -> Assessment {
            let acquired = tokio::time::timeout(Duration::from_secs(2), self.store.begin()).await;
            if let Ok(Ok(session)) = acquired {
                session.rollback().await.unwrap();
                self.connection_free.store(true, Ordering::SeqCst);
            }
            Assessment {
                label: SentimentKind::Neutral,
                score: 0.5,
                origin: AssessmentOrigin::Model,
            }
        }

        fn name(&self) -> &'static str {
            "connection-check"
        }
    }

    #[tokio::test]
    async fn test_no_session_is_held_during_classification() {
        let store = Arc::new(Store::connect("sqlite::memory:").await.unwrap());
        write_headline(
            &store,
            &NewHeadline {
                headline: "Fed suggests interest rate pause".to_string(),
                url: HEADLINE_URL.to_string(),
                source: "Wall Street Journal".to_string(),
                summary: None,
                published_at: Utc::now(),
            },
        )
        .await
        .unwrap();

        let strategy = Arc::new(ConnectionCheckingStrategy {
            store: store.clone(),
            connection_free: AtomicBool::new(false),
        });
        let labeler = SentimentLabeler::new(strategy.clone());

        let outcome = labeler.label_latest(&store).await.unwrap();

        assert!(matches!(outcome, LabelOutcome::Labeled(_)));
        assert!(strategy.connection_free.load(Ordering::SeqCst));
        assert_eq!(store.counts().await.unwrap().sentiment_labels, 1);
    }

    #[tokio::test]
    async fn test_rejected_insert_fails_without_writing() {
        let store = Store::connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            r#"
            CREATE TRIGGER reject_labels BEFORE INSERT ON sentiment_data
            BEGIN SELECT RAISE(ABORT, 'rejected'); END
            "#,
        )
        .execute(store.pool())
        .await
        .unwrap();
        write_headline(
            &store,
            &NewHeadline {
                headline: "Stocks rally".to_string(),
                url: HEADLINE_URL.to_string(),
                source: "Reuters".to_string(),
                summary: None,
                published_at: Utc::now(),
            },
        )
        .await
        .unwrap();
        let labeler = SentimentLabeler::new(Arc::new(crate::sentiment::HeuristicStrategy::new(
            crate::config::HeuristicConfig::default(),
        )));

        assert!(labeler.label_latest(&store).await.is_err());
        assert_eq!(store.counts().await.unwrap().sentiment_labels, 0);
    }
}
