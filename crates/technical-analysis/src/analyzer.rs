use analysis_core::{Candle, IndicatorSnapshot, PriceActionResult, SignalConfig};
use serde::{Deserialize, Serialize};

use crate::indicators::*;
use crate::patterns::analyze_price_action;

/// Indicator snapshot and price action for one candle series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalView {
    pub indicators: IndicatorSnapshot,
    pub price_action: Option<PriceActionResult>,
}

/// Computes indicator snapshots with a fixed set of periods
pub struct TechnicalAnalysisEngine {
    config: SignalConfig,
}

impl TechnicalAnalysisEngine {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn compute_indicators(&self, candles: &[Candle]) -> IndicatorSnapshot {
        compute_indicators(candles, &self.config)
    }

    pub fn analyze(&self, candles: &[Candle]) -> TechnicalView {
        TechnicalView {
            indicators: self.compute_indicators(candles),
            price_action: analyze_price_action(candles),
        }
    }
}

impl Default for TechnicalAnalysisEngine {
    fn default() -> Self {
        Self::new(SignalConfig::default())
    }
}

/// Latest value of every indicator over `candles` (ascending by time).
///
/// Each field is computed independently, so a short series still yields the
/// indicators whose lookback it covers. Never fails; an empty series gives an
/// all-`None` snapshot.
pub fn compute_indicators(candles: &[Candle], config: &SignalConfig) -> IndicatorSnapshot {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    let macd_result = macd(&closes, config.macd_fast, config.macd_slow, config.macd_signal);
    let bb = bollinger_bands(&closes, config.bollinger_period, config.bollinger_std_dev);
    let sr = support_resistance(candles, config.support_resistance_lookback);

    IndicatorSnapshot {
        rsi: rsi(&closes, config.rsi_period),
        macd: macd_result.map(|m| m.macd),
        macd_signal: macd_result.map(|m| m.signal),
        macd_histogram: macd_result.map(|m| m.histogram),
        sma_short: sma(&closes, config.sma_short),
        sma_long: sma(&closes, config.sma_long),
        bollinger_upper: bb.map(|b| b.upper),
        bollinger_middle: bb.map(|b| b.middle),
        bollinger_lower: bb.map(|b| b.lower),
        atr: atr(candles, config.atr_period),
        support: sr.map(|s| s.support),
        resistance: sr.map(|s| s.resistance),
    }
}
