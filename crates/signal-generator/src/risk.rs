use analysis_core::{Candle, IndicatorSnapshot, RiskSettings, SignalType, TrendType};
use serde::{Deserialize, Serialize};

/// Stop and target around an entry price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Volatility unit the levels were sized with
    pub atr: f64,
}

/// Volatility unit for sizing stops: the first positive of the explicit
/// override, the snapshot ATR, the last candle's range, or a fixed share of
/// the entry price.
pub fn effective_atr(
    entry_price: f64,
    indicators: &IndicatorSnapshot,
    candles: &[Candle],
    atr_override: Option<f64>,
    settings: &RiskSettings,
) -> f64 {
    let last_range = candles.last().map(|c| c.high - c.low);

    [atr_override, indicators.atr, last_range]
        .into_iter()
        .flatten()
        .find(|atr| atr.is_finite() && *atr > 0.0)
        .unwrap_or(entry_price * settings.fallback_risk_percent / 100.0)
}

/// Stop loss and take profit for `signal_type`.
///
/// Directional stops sit `atr * multiplier` away, widened when the local trend
/// is up. HOLD gets a symmetric percentage band.
pub fn risk_levels(
    signal_type: SignalType,
    entry_price: f64,
    atr: f64,
    trend: Option<TrendType>,
    settings: &RiskSettings,
) -> RiskLevels {
    let stop_multiplier = if trend == Some(TrendType::Uptrend) {
        settings.trending_stop_atr_multiplier
    } else {
        settings.stop_atr_multiplier
    };
    let stop_distance = atr * stop_multiplier;
    let target_distance = atr * settings.take_profit_atr_multiplier;
    let band = settings.hold_band_percent / 100.0;

    let (stop_loss, take_profit) = match signal_type {
        SignalType::Buy => (entry_price - stop_distance, entry_price + target_distance),
        SignalType::Sell => (entry_price + stop_distance, entry_price - target_distance),
        SignalType::Hold => (entry_price * (1.0 - band), entry_price * (1.0 + band)),
    };

    RiskLevels {
        stop_loss,
        take_profit,
        atr,
    }
}
