use analysis_core::{
    AnalysisError, BarSource, IndicatorSnapshot, NewsSource, OrchestratorConfig, PriceActionResult, Prediction,
    SentimentScorer, SignalConfig, SignalOutcome, TradeSignal,
};
use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use price_predictor::{support_resistance_clusters, volatility_regime, KeyLevels, VolatilityRegime};
use serde::{Deserialize, Serialize};
use signal_generator::analyze_candles;
use std::sync::Arc;
use technical_analysis::{price_change_percent, volume_sma};

pub mod cache;
pub mod sentiment;

#[cfg(test)]
mod tests;

pub use cache::{CacheEntry, SignalCache};
pub use sentiment::{SentimentCategory, SentimentSummary};

/// Candles averaged for the snapshot's volume figure
const VOLUME_SMA_PERIOD: usize = 20;
/// Returns window for the volatility regime
const VOLATILITY_PERIOD: usize = 20;
/// Swing window for clustered key levels
const KEY_LEVEL_WINDOW: usize = 10;

/// Everything one analysis of a symbol produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSnapshot {
    pub symbol: String,
    pub indicators: IndicatorSnapshot,
    pub price_action: Option<PriceActionResult>,
    pub prediction: Option<Prediction>,
    pub sentiment: Option<SentimentSummary>,
    pub outcome: SignalOutcome,
    pub price_change_percent: Option<f64>,
    pub volume_sma: Option<f64>,
    pub volatility_regime: VolatilityRegime,
    pub key_levels: KeyLevels,
    pub last_updated: DateTime<Utc>,
}

/// Fetches bars and news for symbols, runs the signal pipeline and keeps the
/// latest snapshot per symbol.
pub struct SignalOrchestrator {
    bars: Arc<dyn BarSource>,
    news: Option<(Arc<dyn NewsSource>, Arc<dyn SentimentScorer>)>,
    signal_config: SignalConfig,
    config: OrchestratorConfig,
    cache: SignalCache,
}

impl SignalOrchestrator {
    pub fn new(bars: Arc<dyn BarSource>, signal_config: SignalConfig, config: OrchestratorConfig) -> Self {
        Self {
            bars,
            news: None,
            signal_config,
            config,
            cache: SignalCache::new(),
        }
    }

    /// Enable news sentiment as a signal input
    pub fn with_news(mut self, news: Arc<dyn NewsSource>, scorer: Arc<dyn SentimentScorer>) -> Self {
        self.news = Some((news, scorer));
        self
    }

    pub fn signal_config(&self) -> &SignalConfig {
        &self.signal_config
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn cache(&self) -> &SignalCache {
        &self.cache
    }

    /// Analyze one symbol and cache the snapshot.
    ///
    /// A bar fetch failure is returned as an error and leaves any cached
    /// snapshot in place. A news failure only drops the sentiment input.
    pub async fn analyze(&self, symbol: &str) -> Result<SymbolSnapshot, AnalysisError> {
        tracing::info!("Starting signal analysis for {}", symbol);

        let bars = self.bars.fetch_bars(symbol, self.config.lookback_period).await?;
        tracing::info!("Bars count for {}: {}", symbol, bars.len());

        let sentiment = self.fetch_sentiment(symbol).await;
        if let Some(summary) = &sentiment {
            tracing::info!(
                "{} - News Sentiment: {:.2} ({}, {} articles)",
                symbol,
                summary.average_sentiment,
                summary.category,
                summary.total_articles
            );
        }

        let output = analyze_candles(
            symbol,
            &bars,
            sentiment.as_ref().map(|s| s.average_sentiment),
            &self.signal_config,
        );

        match &output.outcome {
            SignalOutcome::Signal(signal) => tracing::info!(
                "{} signal for {}: confidence {:.1}, entry {:.2}, stop {:.2}, target {:.2}",
                signal.signal_type,
                symbol,
                signal.confidence,
                signal.entry_price,
                signal.stop_loss,
                signal.take_profit
            ),
            SignalOutcome::BelowThreshold {
                signal_type,
                confidence,
                threshold,
            } => tracing::info!(
                "No signal for {}: {} at {:.1} below threshold {:.1}",
                symbol,
                signal_type,
                confidence,
                threshold
            ),
            SignalOutcome::InsufficientData { candles, required } => tracing::warn!(
                "Insufficient data for {}: {} candles, need {}",
                symbol,
                candles,
                required
            ),
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let snapshot = SymbolSnapshot {
            symbol: symbol.to_string(),
            indicators: output.indicators,
            price_action: output.price_action,
            prediction: output.prediction,
            sentiment,
            outcome: output.outcome,
            price_change_percent: price_change_percent(&bars),
            volume_sma: volume_sma(&bars, VOLUME_SMA_PERIOD),
            volatility_regime: volatility_regime(&closes, VOLATILITY_PERIOD),
            key_levels: support_resistance_clusters(&closes, KEY_LEVEL_WINDOW),
            last_updated: Utc::now(),
        };

        self.cache.insert(snapshot.clone());
        Ok(snapshot)
    }

    async fn fetch_sentiment(&self, symbol: &str) -> Option<SentimentSummary> {
        let (news, scorer) = self.news.as_ref()?;

        match news.fetch_news(symbol, self.config.news_limit).await {
            Ok(articles) => SentimentSummary::from_articles(&articles, scorer.as_ref()),
            Err(e) => {
                tracing::warn!("Failed to fetch news for {}, continuing without sentiment: {}", symbol, e);
                None
            }
        }
    }

    /// Analyze `symbols` concurrently. Results are in input order.
    pub async fn refresh(&self, symbols: &[String]) -> Vec<Result<SymbolSnapshot, AnalysisError>> {
        let results = join_all(symbols.iter().map(|symbol| self.analyze(symbol))).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            tracing::warn!("Refresh finished with {} of {} symbols failing", failed, symbols.len());
        }
        results
    }

    /// Re-analyze configured symbols that are uncached or older than the
    /// update interval.
    pub async fn refresh_stale(&self) -> Vec<Result<SymbolSnapshot, AnalysisError>> {
        let max_age = self.max_age();
        let stale: Vec<String> = self
            .config
            .symbols
            .iter()
            .filter(|symbol| self.cache.is_stale(symbol, max_age))
            .cloned()
            .collect();

        if stale.is_empty() {
            tracing::debug!("All {} symbols fresh, nothing to refresh", self.config.symbols.len());
            return Vec::new();
        }
        self.refresh(&stale).await
    }

    /// Update interval as a cache age; intervals past chrono's range never expire
    fn max_age(&self) -> Duration {
        i64::try_from(self.config.update_interval_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    pub fn latest(&self, symbol: &str) -> Option<SymbolSnapshot> {
        self.cache.get(symbol)
    }

    /// Actionable signals across all cached symbols
    pub fn latest_signals(&self) -> Vec<TradeSignal> {
        self.cache.signals()
    }

    pub fn cached_symbols(&self) -> Vec<String> {
        self.cache.symbols()
    }
}
