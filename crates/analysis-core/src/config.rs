use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::AnalysisError;

/// How the per-factor scores are folded into one confidence value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringScheme {
    /// Fixed-weight sum of all seven factors
    Weighted,
    /// Prediction-led blend: prediction, technical average, sentiment
    AiFirst,
}

impl FromStr for ScoringScheme {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weighted" => Ok(ScoringScheme::Weighted),
            "ai_first" | "ai-first" | "aifirst" => Ok(ScoringScheme::AiFirst),
            other => Err(AnalysisError::Config(format!("unknown scoring scheme '{}'", other))),
        }
    }
}

/// Factor weights for `ScoringScheme::Weighted` (must sum to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeights {
    pub rsi: f64,              // 0.20
    pub macd: f64,             // 0.20
    pub price_action: f64,     // 0.20
    pub moving_average: f64,   // 0.15
    pub bollinger: f64,        // 0.10
    pub sentiment: f64,        // 0.10
    pub prediction: f64,       // 0.05
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            rsi: 0.20,
            macd: 0.20,
            price_action: 0.20,
            moving_average: 0.15,
            bollinger: 0.10,
            sentiment: 0.10,
            prediction: 0.05,
        }
    }
}

impl FactorWeights {
    pub fn total(&self) -> f64 {
        self.rsi
            + self.macd
            + self.price_action
            + self.moving_average
            + self.bollinger
            + self.sentiment
            + self.prediction
    }
}

/// Blend weights for `ScoringScheme::AiFirst` (must sum to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiFirstWeights {
    pub prediction: f64, // 0.50
    pub technical: f64,  // 0.35
    pub sentiment: f64,  // 0.15
}

impl Default for AiFirstWeights {
    fn default() -> Self {
        Self {
            prediction: 0.50,
            technical: 0.35,
            sentiment: 0.15,
        }
    }
}

impl AiFirstWeights {
    pub fn total(&self) -> f64 {
        self.prediction + self.technical + self.sentiment
    }
}

/// ATR multiples used for stop-loss / take-profit placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskSettings {
    pub stop_atr_multiplier: f64,          // 1.0
    pub trending_stop_atr_multiplier: f64, // 1.5, used when the local trend is up
    pub take_profit_atr_multiplier: f64,   // 2.0
    pub hold_band_percent: f64,            // 2.0, HOLD levels at entry -/+ 2%
    pub fallback_risk_percent: f64,        // 2.0, volatility proxy when no range is known
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            stop_atr_multiplier: 1.0,
            trending_stop_atr_multiplier: 1.5,
            take_profit_atr_multiplier: 2.0,
            hold_band_percent: 2.0,
            fallback_risk_percent: 2.0,
        }
    }
}

/// Everything the indicator-and-signal pipeline reads. Treated as immutable
/// for the lifetime of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub sma_short: usize,
    pub sma_long: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    pub atr_period: usize,
    pub support_resistance_lookback: usize,
    pub prediction_lookback: usize,
    pub min_candles: usize,
    pub confidence_threshold: f64,
    pub scheme: ScoringScheme,
    pub weights: FactorWeights,
    pub ai_first_weights: AiFirstWeights,
    pub risk: RiskSettings,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            sma_short: 20,
            sma_long: 50,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            atr_period: 14,
            support_resistance_lookback: 50,
            prediction_lookback: 20,
            min_candles: 5,
            confidence_threshold: 60.0,
            scheme: ScoringScheme::Weighted,
            weights: FactorWeights::default(),
            ai_first_weights: AiFirstWeights::default(),
            risk: RiskSettings::default(),
        }
    }
}

impl SignalConfig {
    /// Prediction-led configuration with its lower confidence cutoff.
    pub fn ai_first() -> Self {
        Self {
            scheme: ScoringScheme::AiFirst,
            confidence_threshold: 35.0,
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self> {
        let scheme: ScoringScheme = env_or("SCORING_SCHEME", ScoringScheme::Weighted)?;
        let base = match scheme {
            ScoringScheme::Weighted => Self::default(),
            ScoringScheme::AiFirst => Self::ai_first(),
        };

        let config = Self {
            rsi_period: env_or("RSI_PERIOD", base.rsi_period)?,
            rsi_oversold: env_or("RSI_OVERSOLD", base.rsi_oversold)?,
            rsi_overbought: env_or("RSI_OVERBOUGHT", base.rsi_overbought)?,
            macd_fast: env_or("MACD_FAST", base.macd_fast)?,
            macd_slow: env_or("MACD_SLOW", base.macd_slow)?,
            macd_signal: env_or("MACD_SIGNAL", base.macd_signal)?,
            sma_short: env_or("SMA_SHORT", base.sma_short)?,
            sma_long: env_or("SMA_LONG", base.sma_long)?,
            bollinger_period: env_or("BOLLINGER_PERIOD", base.bollinger_period)?,
            bollinger_std_dev: env_or("BOLLINGER_STD_DEV", base.bollinger_std_dev)?,
            atr_period: env_or("ATR_PERIOD", base.atr_period)?,
            confidence_threshold: env_or("CONFIDENCE_THRESHOLD", base.confidence_threshold)?,
            ..base
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        let periods = [
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("sma_short", self.sma_short),
            ("sma_long", self.sma_long),
            ("bollinger_period", self.bollinger_period),
            ("atr_period", self.atr_period),
            ("support_resistance_lookback", self.support_resistance_lookback),
            ("prediction_lookback", self.prediction_lookback),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(AnalysisError::Config(format!("{} must be greater than 0", name)));
        }
        if self.macd_fast >= self.macd_slow {
            return Err(AnalysisError::Config(format!(
                "MACD fast period {} must be shorter than slow period {}",
                self.macd_fast, self.macd_slow
            )));
        }
        if self.sma_short >= self.sma_long {
            return Err(AnalysisError::Config(format!(
                "short SMA period {} must be shorter than long period {}",
                self.sma_short, self.sma_long
            )));
        }
        if self.rsi_oversold >= self.rsi_overbought {
            return Err(AnalysisError::Config(
                "RSI oversold level must be below overbought level".to_string(),
            ));
        }
        if !self.bollinger_std_dev.is_finite() || self.bollinger_std_dev < 0.0 {
            return Err(AnalysisError::Config(format!(
                "Bollinger std dev multiplier {} must be non-negative",
                self.bollinger_std_dev
            )));
        }
        let risk = [
            ("stop_atr_multiplier", self.risk.stop_atr_multiplier),
            ("trending_stop_atr_multiplier", self.risk.trending_stop_atr_multiplier),
            ("take_profit_atr_multiplier", self.risk.take_profit_atr_multiplier),
            ("hold_band_percent", self.risk.hold_band_percent),
            ("fallback_risk_percent", self.risk.fallback_risk_percent),
        ];
        if let Some((name, value)) = risk.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(AnalysisError::Config(format!("{} must be non-negative, got {}", name, value)));
        }
        if !(0.0..=100.0).contains(&self.confidence_threshold) {
            return Err(AnalysisError::Config(format!(
                "confidence threshold {} outside [0, 100]",
                self.confidence_threshold
            )));
        }
        if (self.weights.total() - 1.0).abs() > 1e-6 {
            return Err(AnalysisError::Config(format!(
                "factor weights sum to {:.4}, expected 1.0",
                self.weights.total()
            )));
        }
        if (self.ai_first_weights.total() - 1.0).abs() > 1e-6 {
            return Err(AnalysisError::Config(format!(
                "AI-first weights sum to {:.4}, expected 1.0",
                self.ai_first_weights.total()
            )));
        }
        Ok(())
    }
}

/// Settings for the fetch-and-analyze layer around the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub symbols: Vec<String>,
    pub lookback_period: usize,       // bars requested per analysis
    pub news_limit: usize,
    pub update_interval_seconds: u64, // how stale a cached snapshot may get
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["SPY".to_string(), "BTC-USD".to_string()],
            lookback_period: 100,
            news_limit: 10,
            update_interval_seconds: 1800,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_env() -> Result<Self> {
        let symbols = env::var("SYMBOLS")
            .unwrap_or_else(|_| "SPY,BTC-USD".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let defaults = Self::default();
        Ok(Self {
            symbols,
            lookback_period: env_or("LOOKBACK_PERIOD", defaults.lookback_period)?,
            news_limit: env_or("NEWS_LIMIT", defaults.news_limit)?,
            update_interval_seconds: env_or("UPDATE_INTERVAL", defaults.update_interval_seconds)?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}
