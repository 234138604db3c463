use analysis_core::{
    AnalysisError, BarSource, Candle, NewsArticle, NewsSource, OrchestratorConfig, SentimentScorer, SignalConfig,
    SignalOutcome, SignalType,
};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::*;

fn drifting_candles(symbol: &str, n: usize) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2024, 6, 3, 13, 30, 0).unwrap();
    (0..n)
        .map(|i| Candle {
            timestamp: start + Duration::minutes(15 * i as i64),
            symbol: symbol.to_string(),
            open: 450.0,
            high: 451.0,
            low: 449.0,
            close: 450.0 + 0.1 * i as f64,
            volume: 1_000_000,
        })
        .collect()
}

/// In-memory bars; unknown symbols fail like an unreachable provider
#[derive(Default)]
struct StubBars {
    series: Mutex<HashMap<String, Vec<Candle>>>,
    calls: AtomicUsize,
}

impl StubBars {
    fn with(symbols: &[&str]) -> Self {
        let stub = Self::default();
        for symbol in symbols {
            stub.set(symbol, drifting_candles(symbol, 50));
        }
        stub
    }

    fn set(&self, symbol: &str, candles: Vec<Candle>) {
        self.series.lock().unwrap().insert(symbol.to_string(), candles);
    }
}

#[async_trait]
impl BarSource for StubBars {
    async fn fetch_bars(&self, symbol: &str, limit: usize) -> Result<Vec<Candle>, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let series = self.series.lock().unwrap();
        let candles = series
            .get(symbol)
            .ok_or_else(|| AnalysisError::DataSource(format!("no bars for {}", symbol)))?;
        Ok(candles[candles.len().saturating_sub(limit)..].to_vec())
    }
}

struct StubNews {
    fail: bool,
}

#[async_trait]
impl NewsSource for StubNews {
    async fn fetch_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, AnalysisError> {
        if self.fail {
            return Err(AnalysisError::DataSource("news provider timeout".to_string()));
        }
        Ok((0..limit.min(3))
            .map(|i| NewsArticle {
                id: format!("{}-{}", symbol, i),
                title: format!("{} beats expectations", symbol),
                description: None,
                published_utc: Utc::now(),
                article_url: format!("https://example.com/{}/{}", symbol, i),
            })
            .collect())
    }
}

struct FixedScorer(f64);

impl SentimentScorer for FixedScorer {
    fn score(&self, _text: &str) -> f64 {
        self.0
    }
}

fn orchestrator(bars: Arc<StubBars>, signal_config: SignalConfig) -> SignalOrchestrator {
    let config = OrchestratorConfig {
        symbols: vec!["SPY".to_string(), "QQQ".to_string()],
        ..OrchestratorConfig::default()
    };
    SignalOrchestrator::new(bars, signal_config, config)
}

#[tokio::test]
async fn test_analyze_caches_snapshot() {
    let bars = Arc::new(StubBars::with(&["SPY"]));
    let orchestrator = orchestrator(bars, SignalConfig::default());

    let snapshot = orchestrator.analyze("SPY").await.unwrap();
    assert_eq!(snapshot.symbol, "SPY");
    assert!(snapshot.prediction.is_some());
    assert!(snapshot.sentiment.is_none());
    assert_eq!(snapshot.volume_sma, Some(1_000_000.0));
    assert!(snapshot.price_change_percent.unwrap() > 0.0);
    assert!(matches!(
        snapshot.outcome,
        SignalOutcome::BelowThreshold {
            signal_type: SignalType::Hold,
            ..
        }
    ));

    assert_eq!(orchestrator.latest("SPY"), Some(snapshot));
    assert_eq!(orchestrator.cached_symbols(), vec!["SPY".to_string()]);
    assert!(orchestrator.latest_signals().is_empty());
}

#[tokio::test]
async fn test_bar_failure_is_an_error_and_keeps_cache() {
    let bars = Arc::new(StubBars::with(&["SPY"]));
    let orchestrator = orchestrator(bars, SignalConfig::default());

    let result = orchestrator.analyze("NOPE").await;
    assert!(matches!(result, Err(AnalysisError::DataSource(_))));
    assert!(orchestrator.latest("NOPE").is_none());
    assert!(orchestrator.cache().is_empty());
}

#[tokio::test]
async fn test_news_failure_drops_sentiment_only() {
    let bars = Arc::new(StubBars::with(&["SPY"]));
    let orchestrator = orchestrator(bars, SignalConfig::ai_first())
        .with_news(Arc::new(StubNews { fail: true }), Arc::new(FixedScorer(0.9)));

    let snapshot = orchestrator.analyze("SPY").await.unwrap();
    assert!(snapshot.sentiment.is_none());

    let signal = snapshot.outcome.signal().unwrap();
    assert!(!signal.indicators_used.contains(&"News_Sentiment".to_string()));
}

#[tokio::test]
async fn test_sentiment_feeds_the_signal() {
    let bars = Arc::new(StubBars::with(&["SPY"]));
    let orchestrator = orchestrator(bars, SignalConfig::ai_first())
        .with_news(Arc::new(StubNews { fail: false }), Arc::new(FixedScorer(0.6)));

    let snapshot = orchestrator.analyze("SPY").await.unwrap();
    let sentiment = snapshot.sentiment.as_ref().unwrap();
    assert_eq!(sentiment.total_articles, 3);
    assert_eq!(sentiment.bullish_count, 3);
    assert_eq!(sentiment.category, SentimentCategory::VeryBullish);

    let signal = snapshot.outcome.signal().unwrap();
    assert_eq!(signal.signal_type, SignalType::Buy);
    assert!(signal.indicators_used.contains(&"News_Sentiment".to_string()));

    assert_eq!(orchestrator.latest_signals().len(), 1);
}

#[tokio::test]
async fn test_refresh_keeps_input_order() {
    let bars = Arc::new(StubBars::with(&["SPY", "QQQ"]));
    let orchestrator = orchestrator(bars, SignalConfig::default());

    let symbols = vec!["SPY".to_string(), "BAD".to_string(), "QQQ".to_string()];
    let results = orchestrator.refresh(&symbols).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().symbol, "SPY");
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().symbol, "QQQ");
    assert_eq!(orchestrator.cached_symbols(), vec!["QQQ".to_string(), "SPY".to_string()]);
}

#[tokio::test]
async fn test_last_write_wins() {
    let bars = Arc::new(StubBars::with(&["SPY"]));
    let orchestrator = orchestrator(bars.clone(), SignalConfig::default());

    orchestrator.analyze("SPY").await.unwrap();
    bars.set("SPY", drifting_candles("SPY", 2));
    orchestrator.analyze("SPY").await.unwrap();

    let latest = orchestrator.latest("SPY").unwrap();
    assert_eq!(latest.outcome, SignalOutcome::InsufficientData { candles: 2, required: 5 });
    assert!(latest.price_action.is_none());
    assert_eq!(orchestrator.cache().len(), 1);
}

#[tokio::test]
async fn test_refresh_stale_skips_fresh_symbols() {
    let bars = Arc::new(StubBars::with(&["SPY", "QQQ"]));
    let orchestrator = orchestrator(bars.clone(), SignalConfig::default());

    let first = orchestrator.refresh_stale().await;
    assert_eq!(first.len(), 2);
    assert_eq!(bars.calls.load(Ordering::SeqCst), 2);

    let second = orchestrator.refresh_stale().await;
    assert!(second.is_empty());
    assert_eq!(bars.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_zero_interval_always_refreshes() {
    let bars = Arc::new(StubBars::with(&["SPY"]));
    let config = OrchestratorConfig {
        symbols: vec!["SPY".to_string()],
        update_interval_seconds: 0,
        ..OrchestratorConfig::default()
    };
    let orchestrator = SignalOrchestrator::new(bars.clone(), SignalConfig::default(), config);

    orchestrator.refresh_stale().await;
    orchestrator.refresh_stale().await;
    assert_eq!(bars.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_huge_interval_never_expires() {
    let bars = Arc::new(StubBars::with(&["SPY"]));
    let config = OrchestratorConfig {
        symbols: vec!["SPY".to_string()],
        update_interval_seconds: u64::MAX,
        ..OrchestratorConfig::default()
    };
    let orchestrator = SignalOrchestrator::new(bars.clone(), SignalConfig::default(), config);

    assert_eq!(orchestrator.refresh_stale().await.len(), 1);
    assert!(orchestrator.refresh_stale().await.is_empty());
    assert_eq!(bars.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_lookback_limits_bars() {
    let bars = Arc::new(StubBars::default());
    bars.set("SPY", drifting_candles("SPY", 150));
    let orchestrator = orchestrator(bars, SignalConfig::default());

    let snapshot = orchestrator.analyze("SPY").await.unwrap();
    // 100 bars requested: closes 455.0 through 464.9
    let change = snapshot.price_change_percent.unwrap();
    assert!((change - (464.9 - 455.0) / 455.0 * 100.0).abs() < 1e-9);
}
