use analysis_core::{Candle, PriceActionResult, PricePattern, TrendType};

/// Minimum number of candles price action looks at
pub const PRICE_ACTION_CANDLES: usize = 3;

/// Body, range and wick measurements of a single candle
struct CandleShape {
    body: f64,
    range: f64,
    body_percent: f64,
    lower_wick: f64,
    upper_wick: f64,
}

impl CandleShape {
    fn of(candle: &Candle) -> Self {
        let body = (candle.close - candle.open).abs();
        let range = candle.high - candle.low;
        let body_percent = if range > 0.0 {
            (body / range * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        Self {
            body,
            range,
            body_percent,
            lower_wick: candle.open.min(candle.close) - candle.low,
            upper_wick: candle.high - candle.open.max(candle.close),
        }
    }
}

/// Small body with long wicks on both sides
fn is_doji(shape: &CandleShape) -> bool {
    shape.body_percent < 10.0 && shape.range > shape.body * 2.0
}

/// Small body, long lower wick
fn is_hammer(shape: &CandleShape) -> bool {
    shape.body_percent < 20.0 && shape.lower_wick > shape.body * 2.0
}

/// Small body, long upper wick
fn is_shooting_star(shape: &CandleShape) -> bool {
    shape.body_percent < 20.0 && shape.upper_wick > shape.body * 2.0
}

/// Large body, small wicks
fn is_strong_candle(shape: &CandleShape) -> bool {
    shape.body_percent > 70.0
}

/// Detect engulfing pattern (requires 2 bars)
fn engulfing(prev: &Candle, curr: &Candle) -> Option<PricePattern> {
    let prev_bullish = prev.close > prev.open;
    let prev_bearish = prev.close < prev.open;
    let curr_bullish = curr.close > curr.open;
    let curr_bearish = curr.close < curr.open;

    if curr_bullish && prev_bearish && curr.open < prev.close && curr.close > prev.open {
        return Some(PricePattern::BullishEngulfing);
    }
    if curr_bearish && prev_bullish && curr.open > prev.close && curr.close < prev.open {
        return Some(PricePattern::BearishEngulfing);
    }
    None
}

/// Current bar's range sits strictly inside the previous bar's range
fn is_inside_bar(prev: &Candle, curr: &Candle) -> bool {
    curr.high < prev.high && curr.low > prev.low
}

/// Higher high and higher low = uptrend, lower high and lower low = downtrend
pub fn detect_trend(prev: &Candle, curr: &Candle) -> TrendType {
    let higher_high = curr.high > prev.high;
    let higher_low = curr.low > prev.low;
    let lower_high = curr.high < prev.high;
    let lower_low = curr.low < prev.low;

    if higher_high && higher_low {
        TrendType::Uptrend
    } else if lower_high && lower_low {
        TrendType::Downtrend
    } else {
        TrendType::Ranging
    }
}

/// Classify the most recent candles.
///
/// Returns `None` for fewer than three candles; callers treat that as neutral.
/// Tags are listed in rule order and may co-occur.
pub fn analyze_price_action(candles: &[Candle]) -> Option<PriceActionResult> {
    if candles.len() < PRICE_ACTION_CANDLES {
        return None;
    }

    let last = &candles[candles.len() - 1];
    let prev = &candles[candles.len() - 2];
    let shape = CandleShape::of(last);

    let mut patterns = Vec::new();
    if is_doji(&shape) {
        patterns.push(PricePattern::Doji);
    }
    if is_hammer(&shape) {
        patterns.push(PricePattern::Hammer);
    }
    if is_shooting_star(&shape) {
        patterns.push(PricePattern::ShootingStar);
    }
    if is_strong_candle(&shape) {
        patterns.push(PricePattern::StrongCandle);
    }
    if let Some(p) = engulfing(prev, last) {
        patterns.push(p);
    }
    if is_inside_bar(prev, last) {
        patterns.push(PricePattern::InsideBar);
    }

    let close_position = if shape.range > 0.0 {
        ((last.close - last.low) / shape.range).clamp(0.0, 1.0)
    } else {
        0.5
    };

    Some(PriceActionResult {
        is_bullish: last.close > last.open,
        is_bearish: last.close < last.open,
        body_percent: shape.body_percent,
        patterns,
        trend_type: detect_trend(prev, last),
        close_position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bar(i: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::days(i),
            symbol: "SPY".to_string(),
            open,
            high,
            low,
            close,
            volume: 1_000_000,
        }
    }

    fn with_last(last: Candle) -> Vec<Candle> {
        vec![
            bar(0, 100.0, 101.0, 99.0, 100.5),
            bar(1, 100.5, 101.5, 99.5, 101.0),
            last,
        ]
    }

    #[test]
    fn test_requires_three_candles() {
        let candles = vec![bar(0, 100.0, 101.0, 99.0, 100.5), bar(1, 100.5, 101.5, 99.5, 101.0)];
        assert!(analyze_price_action(&candles).is_none());
        assert!(analyze_price_action(&[]).is_none());
    }

    #[test]
    fn test_doji() {
        // body 0.05 on a range of 2.0
        let result = analyze_price_action(&with_last(bar(2, 100.0, 101.0, 99.0, 100.05))).unwrap();
        assert!(result.has_pattern(PricePattern::Doji));
        assert!(result.is_bullish);
        assert!(result.body_percent < 10.0);
    }

    #[test]
    fn test_hammer() {
        // body 0.2 at the top, lower wick 1.8
        let result = analyze_price_action(&with_last(bar(2, 100.8, 101.05, 99.0, 101.0))).unwrap();
        assert!(result.has_pattern(PricePattern::Hammer));
        assert!(!result.has_pattern(PricePattern::ShootingStar));
    }

    #[test]
    fn test_shooting_star() {
        // body 0.2 at the bottom, upper wick 1.8
        let result = analyze_price_action(&with_last(bar(2, 99.2, 101.0, 98.95, 99.0))).unwrap();
        assert!(result.has_pattern(PricePattern::ShootingStar));
        assert!(!result.has_pattern(PricePattern::Hammer));
        assert!(result.is_bearish);
    }

    #[test]
    fn test_strong_candle() {
        let result = analyze_price_action(&with_last(bar(2, 100.0, 102.1, 99.9, 102.0))).unwrap();
        assert!(result.has_pattern(PricePattern::StrongCandle));
        assert!(result.is_bullish);
        assert!(result.body_percent > 70.0 && result.body_percent <= 100.0);
    }

    #[test]
    fn test_flat_candle_is_neither_bullish_nor_bearish() {
        let result = analyze_price_action(&with_last(bar(2, 100.0, 100.0, 100.0, 100.0))).unwrap();
        assert!(!result.is_bullish);
        assert!(!result.is_bearish);
        assert_eq!(result.body_percent, 0.0);
        assert_eq!(result.close_position, 0.5);
        // zero range never reads as a doji or hammer; it still sits inside the prior bar
        assert_eq!(result.patterns, vec![PricePattern::InsideBar]);
    }

    #[test]
    fn test_engulfing_and_inside_bar() {
        let candles = vec![
            bar(0, 100.0, 101.0, 99.0, 100.5),
            bar(1, 101.0, 101.2, 99.8, 100.0),
            bar(2, 99.9, 101.6, 99.7, 101.5),
        ];
        let result = analyze_price_action(&candles).unwrap();
        assert!(result.has_pattern(PricePattern::BullishEngulfing));

        let candles = vec![
            bar(0, 100.0, 101.0, 99.0, 100.5),
            bar(1, 100.0, 103.0, 98.0, 101.0),
            bar(2, 100.5, 102.0, 99.0, 100.6),
        ];
        let result = analyze_price_action(&candles).unwrap();
        assert!(result.has_pattern(PricePattern::InsideBar));
        assert_eq!(result.trend_type, TrendType::Ranging);
    }

    #[test]
    fn test_trend_detection() {
        let up = with_last(bar(2, 101.0, 102.0, 100.0, 101.5));
        assert_eq!(analyze_price_action(&up).unwrap().trend_type, TrendType::Uptrend);

        let down = with_last(bar(2, 100.0, 101.0, 99.0, 99.5));
        assert_eq!(analyze_price_action(&down).unwrap().trend_type, TrendType::Downtrend);

        let outside = with_last(bar(2, 100.0, 102.0, 99.0, 100.5));
        assert_eq!(analyze_price_action(&outside).unwrap().trend_type, TrendType::Ranging);
    }

    #[test]
    fn test_close_position() {
        let result = analyze_price_action(&with_last(bar(2, 101.0, 102.0, 100.0, 101.5))).unwrap();
        assert!((result.close_position - 0.75).abs() < 1e-12);
    }
}
