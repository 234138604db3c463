use async_trait::async_trait;
use crate::{AnalysisError, Candle, NewsArticle};

/// Provider of OHLCV history, ascending by timestamp
#[async_trait]
pub trait BarSource: Send + Sync {
    async fn fetch_bars(&self, symbol: &str, limit: usize) -> Result<Vec<Candle>, AnalysisError>;
}

/// Provider of recent news for a symbol
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, AnalysisError>;
}

/// Text sentiment model. Scores are expected in [-1, 1]; callers clamp anyway.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> f64;
}
