use analysis_core::{NewsArticle, SentimentScorer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Article scores above this count as bullish, below its negative as bearish
const ARTICLE_LEAN: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentCategory {
    VeryBullish,
    Bullish,
    Neutral,
    Bearish,
    VeryBearish,
}

impl SentimentCategory {
    pub fn from_score(score: f64) -> Self {
        if score > 0.5 {
            SentimentCategory::VeryBullish
        } else if score > 0.2 {
            SentimentCategory::Bullish
        } else if score > -0.2 {
            SentimentCategory::Neutral
        } else if score > -0.5 {
            SentimentCategory::Bearish
        } else {
            SentimentCategory::VeryBearish
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SentimentCategory::VeryBullish => "Very Bullish",
            SentimentCategory::Bullish => "Bullish",
            SentimentCategory::Neutral => "Neutral",
            SentimentCategory::Bearish => "Bearish",
            SentimentCategory::VeryBearish => "Very Bearish",
        }
    }
}

impl fmt::Display for SentimentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Aggregate news sentiment for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub average_sentiment: f64,
    pub category: SentimentCategory,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub neutral_count: usize,
    pub total_articles: usize,
}

impl SentimentSummary {
    /// Score every article and aggregate. `None` when there are no articles,
    /// so callers don't mistake "no news" for neutral news.
    pub fn from_articles(articles: &[NewsArticle], scorer: &dyn SentimentScorer) -> Option<Self> {
        if articles.is_empty() {
            return None;
        }

        let scores: Vec<f64> = articles
            .iter()
            .map(|article| {
                let score = scorer.score(&article.text());
                if score.is_finite() {
                    score.clamp(-1.0, 1.0)
                } else {
                    0.0
                }
            })
            .collect();

        let bullish_count = scores.iter().filter(|s| **s > ARTICLE_LEAN).count();
        let bearish_count = scores.iter().filter(|s| **s < -ARTICLE_LEAN).count();
        let average_sentiment = scores.iter().sum::<f64>() / scores.len() as f64;

        Some(Self {
            average_sentiment,
            category: SentimentCategory::from_score(average_sentiment),
            bullish_count,
            bearish_count,
            neutral_count: scores.len() - bullish_count - bearish_count,
            total_articles: scores.len(),
        })
    }
}
