use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::AnalysisError;

/// OHLCV candle for one fixed interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Candle {
    /// Check the OHLC shape invariants. The pipeline itself never calls this;
    /// it is offered to data sources that want to reject bad bars early.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) {
            return Err(AnalysisError::InvalidData(format!(
                "{} candle at {} has non-finite prices",
                self.symbol, self.timestamp
            )));
        }
        if self.high < self.open.max(self.close).max(self.low) {
            return Err(AnalysisError::InvalidData(format!(
                "{} candle at {}: high {} below body",
                self.symbol, self.timestamp, self.high
            )));
        }
        if self.low > self.open.min(self.close).min(self.high) {
            return Err(AnalysisError::InvalidData(format!(
                "{} candle at {}: low {} above body",
                self.symbol, self.timestamp, self.low
            )));
        }
        Ok(())
    }
}

/// News article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub published_utc: DateTime<Utc>,
    pub article_url: String,
}

impl NewsArticle {
    /// Headline and body joined, the text handed to a sentiment scorer.
    pub fn text(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {}", self.title, description),
            None => self.title.clone(),
        }
    }
}

/// Latest value of every indicator; a field is `None` when the series was too
/// short for its lookback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_middle: Option<f64>,
    pub bollinger_lower: Option<f64>,
    pub atr: Option<f64>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
}

/// Candle shape tags detected on the most recent bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePattern {
    Doji,
    Hammer,
    ShootingStar,
    StrongCandle,
    BullishEngulfing,
    BearishEngulfing,
    InsideBar,
}

impl PricePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricePattern::Doji => "doji",
            PricePattern::Hammer => "hammer",
            PricePattern::ShootingStar => "shooting_star",
            PricePattern::StrongCandle => "strong_candle",
            PricePattern::BullishEngulfing => "bullish_engulfing",
            PricePattern::BearishEngulfing => "bearish_engulfing",
            PricePattern::InsideBar => "inside_bar",
        }
    }
}

impl fmt::Display for PricePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local trend from the last two candles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendType {
    Uptrend,
    Downtrend,
    Ranging,
}

impl TrendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendType::Uptrend => "uptrend",
            TrendType::Downtrend => "downtrend",
            TrendType::Ranging => "ranging",
        }
    }
}

impl fmt::Display for TrendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price action classification of the most recent candles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceActionResult {
    pub is_bullish: bool,
    pub is_bearish: bool,
    pub body_percent: f64,
    pub patterns: Vec<PricePattern>,
    pub trend_type: TrendType,
    pub close_position: f64,
}

impl PriceActionResult {
    pub fn has_pattern(&self, pattern: PricePattern) -> bool {
        self.patterns.contains(&pattern)
    }
}

/// Directional prediction in [-1, 1] with a confidence in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub direction: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    Buy,
    Sell,
    Hold,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Buy => "BUY",
            SignalType::Sell => "SELL",
            SignalType::Hold => "HOLD",
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actionable recommendation produced by one analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub symbol: String,
    pub signal_type: SignalType,
    pub confidence: f64, // 0.0 to 100.0
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub reasoning: String,
    pub indicators_used: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl TradeSignal {
    /// Reward-to-risk ratio, `None` when the stop sits on the entry.
    pub fn risk_reward(&self) -> Option<f64> {
        let risk = self.entry_price - self.stop_loss;
        if risk == 0.0 {
            return None;
        }
        Some((self.take_profit - self.entry_price) / risk)
    }
}

/// Result of one signal evaluation. Keeps "not enough candles" and
/// "confidence too low" apart for callers that care.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SignalOutcome {
    Signal(TradeSignal),
    InsufficientData {
        candles: usize,
        required: usize,
    },
    BelowThreshold {
        signal_type: SignalType,
        confidence: f64,
        threshold: f64,
    },
}

impl SignalOutcome {
    pub fn signal(&self) -> Option<&TradeSignal> {
        match self {
            SignalOutcome::Signal(signal) => Some(signal),
            _ => None,
        }
    }

    pub fn into_signal(self) -> Option<TradeSignal> {
        match self {
            SignalOutcome::Signal(signal) => Some(signal),
            _ => None,
        }
    }
}
