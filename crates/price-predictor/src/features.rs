use analysis_core::{Candle, IndicatorSnapshot, Prediction, SignalConfig};

use crate::trend::predict_next_move;

/// Fewest candles the feature model accepts regardless of lookback
pub const MIN_FEATURE_CANDLES: usize = 5;

/// Candles averaged for the volume spike feature
const VOLUME_WINDOW: usize = 20;

const BASE_WEIGHT: f64 = 0.35;
const RSI_WEIGHT: f64 = 0.15;
const MACD_WEIGHT: f64 = 0.15;
const MA_WEIGHT: f64 = 0.15;
const VOLUME_WEIGHT: f64 = 0.10;
const SENTIMENT_WEIGHT: f64 = 0.10;

/// Number of features the model can blend
const FEATURE_COUNT: f64 = 6.0;

/// Weighted blend of the trend model with indicator, volume and sentiment features.
///
/// Features whose inputs are missing are left out and the remaining weights
/// renormalised. Returns `None` below `max(lookback, 5)` candles.
pub fn predict_with_features(
    candles: &[Candle],
    indicators: &IndicatorSnapshot,
    sentiment: Option<f64>,
    lookback: usize,
) -> Option<Prediction> {
    if candles.is_empty() || candles.len() < lookback.max(MIN_FEATURE_CANDLES) {
        return None;
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let last_price = *closes.last()?;

    let base = predict_next_move(&closes, lookback);
    let mut features: Vec<(f64, f64)> = Vec::with_capacity(6);

    if let Some(base) = base {
        features.push((base.direction, BASE_WEIGHT));
    }

    if let Some(rsi) = indicators.rsi {
        features.push(((rsi - 50.0) / 50.0, RSI_WEIGHT));
    }

    let histogram = indicators.macd_histogram.or_else(|| {
        indicators
            .macd
            .zip(indicators.macd_signal)
            .map(|(macd, signal)| macd - signal)
    });
    if let Some(histogram) = histogram {
        if last_price != 0.0 {
            let scale = (last_price * 0.005).max(1e-6);
            features.push(((histogram / scale).tanh(), MACD_WEIGHT));
        }
    }

    if let (Some(short), Some(long)) = (indicators.sma_short, indicators.sma_long) {
        if last_price != 0.0 {
            let ma_trend = if short > long { 1.0 } else { -1.0 };
            let price_vs_sma = (last_price - short) / last_price;
            features.push(((price_vs_sma * 5.0).tanh() + 0.2 * ma_trend, MA_WEIGHT));
        }
    }

    if last_price != 0.0 {
        let recent = &candles[candles.len().saturating_sub(VOLUME_WINDOW)..];
        let avg_volume = recent.iter().map(|c| c.volume as f64).sum::<f64>() / recent.len() as f64;
        if avg_volume > 0.0 {
            let last_volume = candles[candles.len() - 1].volume as f64;
            features.push(((last_volume / avg_volume - 1.0).tanh(), VOLUME_WEIGHT));
        }
    }

    if let Some(sentiment) = sentiment.filter(|s| s.is_finite()) {
        features.push((sentiment.tanh(), SENTIMENT_WEIGHT));
    }

    if features.is_empty() {
        return None;
    }

    let total_weight: f64 = features.iter().map(|(_, w)| w).sum();
    let direction = (features.iter().map(|(f, w)| f * w).sum::<f64>() / total_weight).clamp(-1.0, 1.0);

    let mut confidence = (direction.abs() * 0.8 + features.len() as f64 / FEATURE_COUNT * 0.2).min(1.0);
    if let Some(base) = base {
        confidence = ((confidence + base.confidence) / 2.0).min(1.0);
    }

    Some(Prediction { direction, confidence })
}

/// Feature-model prediction using the configured lookback.
pub fn predict(
    candles: &[Candle],
    indicators: &IndicatorSnapshot,
    sentiment: Option<f64>,
    config: &SignalConfig,
) -> Option<Prediction> {
    predict_with_features(candles, indicators, sentiment, config.prediction_lookback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candles_from(closes: &[f64], volume: u64) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: start + Duration::days(i as i64),
                symbol: "SPY".to_string(),
                open: close - 0.1,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume,
            })
            .collect()
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 450.0 + i as f64 * 0.1 + (i % 4) as f64 * 0.05).collect()
    }

    #[test]
    fn test_requires_minimum_candles() {
        let candles = candles_from(&rising(4), 1_000);
        assert!(predict_with_features(&candles, &IndicatorSnapshot::default(), None, 3).is_none());

        let candles = candles_from(&rising(19), 1_000);
        assert!(predict_with_features(&candles, &IndicatorSnapshot::default(), None, 20).is_none());
    }

    #[test]
    fn test_missing_features_are_renormalised() {
        let closes = rising(30);
        let candles = candles_from(&closes, 1_000);
        let base = predict_next_move(&closes, 20).unwrap();

        // only the trend model and a flat volume feature contribute
        let prediction = predict_with_features(&candles, &IndicatorSnapshot::default(), None, 20).unwrap();
        let expected = (0.35 * base.direction) / 0.45;
        assert!((prediction.direction - expected).abs() < 1e-12);

        let features_conf = (expected.abs() * 0.8 + 2.0 / 6.0 * 0.2).min(1.0);
        assert!((prediction.confidence - (features_conf + base.confidence) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_without_base_model() {
        // 20 candles with lookback 20: the trend model needs 21
        let candles = candles_from(&rising(20), 1_000);
        let indicators = IndicatorSnapshot {
            rsi: Some(80.0),
            ..Default::default()
        };

        let prediction = predict_with_features(&candles, &indicators, None, 20).unwrap();
        // (0.15 * 0.6 + 0.10 * 0.0) / 0.25
        assert!((prediction.direction - 0.36).abs() < 1e-12);
        assert!((prediction.confidence - (0.36 * 0.8 + 2.0 / 6.0 * 0.2)).abs() < 1e-12);
    }

    #[test]
    fn test_macd_histogram_falls_back_to_lines() {
        let candles = candles_from(&rising(20), 1_000);
        let with_hist = IndicatorSnapshot {
            macd_histogram: Some(0.5),
            ..Default::default()
        };
        let with_lines = IndicatorSnapshot {
            macd: Some(1.5),
            macd_signal: Some(1.0),
            ..Default::default()
        };

        let a = predict_with_features(&candles, &with_hist, None, 20).unwrap();
        let b = predict_with_features(&candles, &with_lines, None, 20).unwrap();
        assert!((a.direction - b.direction).abs() < 1e-12);
        assert!(a.direction > 0.0);
    }

    #[test]
    fn test_sentiment_moves_direction() {
        let closes = rising(30);
        let candles = candles_from(&closes, 1_000);
        let indicators = IndicatorSnapshot::default();
        let base = predict_next_move(&closes, 20).unwrap();

        let bullish = predict(&candles, &indicators, Some(0.9), &SignalConfig::default()).unwrap();
        let bearish = predict(&candles, &indicators, Some(-0.9), &SignalConfig::default()).unwrap();
        assert!(bullish.direction > bearish.direction);

        // trend, flat volume and sentiment: weights 0.35 + 0.10 + 0.10
        let expected = (0.35 * base.direction + 0.10 * 0.9_f64.tanh()) / 0.55;
        assert!((bullish.direction - expected).abs() < 1e-12);
        let expected = (0.35 * base.direction - 0.10 * 0.9_f64.tanh()) / 0.55;
        assert!((bearish.direction - expected).abs() < 1e-12);
    }

    #[test]
    fn test_non_finite_sentiment_is_ignored() {
        let candles = candles_from(&rising(30), 1_000);
        let indicators = IndicatorSnapshot::default();

        let without = predict_with_features(&candles, &indicators, None, 20).unwrap();
        for sentiment in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let prediction = predict_with_features(&candles, &indicators, Some(sentiment), 20).unwrap();
            assert_eq!(prediction, without);
        }
    }

    #[test]
    fn test_output_bounds() {
        let candles = candles_from(&rising(50), 5_000);
        let indicators = IndicatorSnapshot {
            rsi: Some(100.0),
            macd_histogram: Some(50.0),
            sma_short: Some(400.0),
            sma_long: Some(300.0),
            ..Default::default()
        };

        let prediction = predict_with_features(&candles, &indicators, Some(5.0), 20).unwrap();
        assert!((-1.0..=1.0).contains(&prediction.direction));
        assert!((0.0..=1.0).contains(&prediction.confidence));
        assert!(prediction.direction > 0.5);
    }

    #[test]
    fn test_zero_volume_drops_feature() {
        let closes = rising(20);
        let candles = candles_from(&closes, 0);
        let indicators = IndicatorSnapshot {
            rsi: Some(75.0),
            ..Default::default()
        };

        // RSI is the only feature left
        let prediction = predict_with_features(&candles, &indicators, None, 20).unwrap();
        assert!((prediction.direction - 0.5).abs() < 1e-12);
    }
}
