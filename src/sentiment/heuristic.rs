//! Keyword heuristic strategy.

use async_trait::async_trait;
use rand::Rng;

use super::{Assessment, AssessmentOrigin, SentimentStrategy};
use crate::config::HeuristicConfig;
use crate::types::SentimentKind;

/// Labels a headline by substring search over configured keyword tables.
///
/// Bullish keywords are checked before bearish ones, so a headline matching
/// both tables is bullish.
#[derive(Debug, Clone)]
pub struct HeuristicStrategy {
    config: HeuristicConfig,
}

impl HeuristicStrategy {
    /// Keywords are lower-cased and blank entries dropped, since matching
    /// runs against the lower-cased headline.
    pub fn new(mut config: HeuristicConfig) -> Self {
        config.bullish_keywords = normalize_keywords(config.bullish_keywords);
        config.bearish_keywords = normalize_keywords(config.bearish_keywords);
        Self { config }
    }

    /// Deterministic label for a headline.
    pub fn classify(&self, headline: &str) -> SentimentKind {
        let lowered = headline.to_lowercase();
        let matches = |keywords: &[String]| keywords.iter().any(|k| lowered.contains(k.as_str()));

        if matches(self.config.bullish_keywords.as_slice()) {
            SentimentKind::Bullish
        } else if matches(self.config.bearish_keywords.as_slice()) {
            SentimentKind::Bearish
        } else {
            SentimentKind::Neutral
        }
    }

    /// Label plus a score drawn from `rng`.
    pub fn assess_with<R: Rng + ?Sized>(&self, headline: &str, rng: &mut R) -> Assessment {
        let label = self.classify(headline);
        let score = match label {
            SentimentKind::Neutral => self.config.neutral_score,
            SentimentKind::Bullish | SentimentKind::Bearish => {
                let (low, high) = self.config.polar_score_range;
                if high > low {
                    rng.gen_range(low..high)
                } else {
                    low
                }
            }
        };

        Assessment {
            label,
            score,
            origin: AssessmentOrigin::Heuristic,
        }
    }
}

fn normalize_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

#[async_trait]
impl SentimentStrategy for HeuristicStrategy {
    async fn assess(&self, headline: &str) -> Assessment {
        self.assess_with(headline, &mut rand::thread_rng())
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn strategy() -> HeuristicStrategy {
        HeuristicStrategy::new(HeuristicConfig::default())
    }

    #[test]
    fn test_bullish_keywords() {
        let s = strategy();
        for headline in [
            "Apple announces breakthrough in AI",
            "Markets RALLY after jobs report",
            "Chipmaker posts record growth",
            "BREAKTHROUGH battery tech",
        ] {
            assert_eq!(s.classify(headline), SentimentKind::Bullish, "{}", headline);
        }
    }

    #[test]
    fn test_bearish_keywords() {
        let s = strategy();
        for headline in [
            "Market crash imminent due to regulations",
            "New REGULATIONS hit banks",
            "Oil prices drop sharply",
            "Crash fears return",
        ] {
            assert_eq!(s.classify(headline), SentimentKind::Bearish, "{}", headline);
        }
    }

    #[test]
    fn test_neutral_when_nothing_matches() {
        let s = strategy();
        for headline in [
            "Fed suggests interest rate pause",
            "Tech giants face new antitrust probe",
            "Consumer spending shows unexpected resilience",
            "",
        ] {
            assert_eq!(s.classify(headline), SentimentKind::Neutral, "{}", headline);
        }
    }

    #[test]
    fn test_bullish_wins_when_both_tables_match() {
        assert_eq!(strategy().classify("Rally follows crash"), SentimentKind::Bullish);
    }

    #[test]
    fn test_keywords_match_as_substrings() {
        // "up" inside "supply" counts
        assert_eq!(
            strategy().classify("Global supply chain disruptions easing"),
            SentimentKind::Bullish
        );
    }

    #[test]
    fn test_scores_follow_label() {
        let s = strategy();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let bull = s.assess_with("Stocks rally", &mut rng);
            assert!((0.7..0.9).contains(&bull.score));
            assert_eq!(bull.origin, AssessmentOrigin::Heuristic);

            let bear = s.assess_with("Stocks crash", &mut rng);
            assert!((0.7..0.9).contains(&bear.score));
        }

        let neutral = s.assess_with("Fed pause", &mut rng);
        assert_eq!(neutral.label, SentimentKind::Neutral);
        assert_eq!(neutral.score, 0.5);
    }

    #[test]
    fn test_custom_keyword_tables() {
        let s = HeuristicStrategy::new(HeuristicConfig {
            bullish_keywords: vec!["upgrade".to_string()],
            bearish_keywords: vec!["downgrade".to_string()],
            polar_score_range: (0.8, 0.8),
            neutral_score: 0.45,
        });
        let mut rng = StdRng::seed_from_u64(0);

        let up = s.assess_with("Analyst upgrade for MSFT", &mut rng);
        assert_eq!(up.label, SentimentKind::Bullish);
        assert_eq!(up.score, 0.8);
        assert_eq!(s.classify("Analyst downgrade"), SentimentKind::Bearish);
        assert_eq!(s.assess_with("Stocks rally", &mut rng).score, 0.45);
    }

    #[test]
    fn test_keywords_are_case_insensitive_on_both_sides() {
        let s = HeuristicStrategy::new(HeuristicConfig {
            bullish_keywords: vec!["Upgrade".to_string(), "  ".to_string()],
            bearish_keywords: vec!["DOWNGRADE ".to_string()],
            ..HeuristicConfig::default()
        });

        assert_eq!(s.classify("analyst UPGRADE for MSFT"), SentimentKind::Bullish);
        assert_eq!(s.classify("Analyst downgrade"), SentimentKind::Bearish);
        // A blank keyword would otherwise match every headline
        assert_eq!(s.classify("Fed pause"), SentimentKind::Neutral);
    }

    #[tokio::test]
    async fn test_strategy_trait_assess() {
        let a = strategy().assess("Rally continues").await;
        assert_eq!(a.label, SentimentKind::Bullish);
        assert_eq!(strategy().name(), "heuristic");
    }
}
