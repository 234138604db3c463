use analysis_core::stats::{mean, population_std_dev};
use analysis_core::Candle;
use serde::{Deserialize, Serialize};

/// Simple Moving Average of the last `period` points
pub fn sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }

    Some(mean(&data[data.len() - period..]))
}

/// Exponential Moving Average series.
///
/// Seeded with the mean of the first `period` points, so the output holds
/// `data.len() - period + 1` values (empty if the input is shorter than `period`).
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len() - period + 1);

    let mut prev = mean(&data[..period]);
    result.push(prev);

    for &price in &data[period..] {
        prev = price * k + prev * (1.0 - k);
        result.push(prev);
    }

    result
}

/// Relative Strength Index over the last `period` price changes.
///
/// Uses plain averages rather than Wilder smoothing. A series with no losses
/// reads 100, a flat series reads 50.
pub fn rsi(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period + 1 {
        return None;
    }

    let window = &data[data.len() - period - 1..];
    let mut gains = 0.0;
    let mut losses = 0.0;
    for w in window.windows(2) {
        let change = w[1] - w[0];
        if change > 0.0 {
            gains += change;
        } else {
            losses += change.abs();
        }
    }

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return Some(if avg_gain > 0.0 { 100.0 } else { 50.0 });
    }

    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

/// Latest MACD values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdResult {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// MACD (Moving Average Convergence Divergence)
pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> Option<MacdResult> {
    if fast_period == 0 || signal_period == 0 || slow_period < fast_period || data.len() < slow_period {
        return None;
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    // The fast series starts earlier; drop its head so both end on the same bar
    let offset = ema_fast.len() - ema_slow.len();
    let macd_line: Vec<f64> = ema_fast[offset..]
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();

    if macd_line.len() < signal_period {
        return None;
    }

    let signal_line = ema(&macd_line, signal_period);
    let macd = *macd_line.last()?;
    let signal = *signal_line.last()?;

    Some(MacdResult {
        macd,
        signal,
        histogram: macd - signal,
    })
}

/// Latest Bollinger Band values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// Where `price` sits inside the band: 0 at the lower band, 1 at the upper.
    /// A collapsed band reads 0.5.
    pub fn position(&self, price: f64) -> f64 {
        let width = self.upper - self.lower;
        if width > 0.0 {
            (price - self.lower) / width
        } else {
            0.5
        }
    }
}

pub fn bollinger_bands(data: &[f64], period: usize, std_dev: f64) -> Option<BollingerBands> {
    if period == 0 || data.len() < period {
        return None;
    }

    let window = &data[data.len() - period..];
    let middle = mean(window);
    let band = std_dev * population_std_dev(window);

    Some(BollingerBands {
        upper: middle + band,
        middle,
        lower: middle - band,
    })
}

/// Average True Range: plain mean of the last `period` true ranges
pub fn atr(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let true_ranges: Vec<f64> = candles
        .windows(2)
        .map(|w| {
            let (prev, curr) = (&w[0], &w[1]);
            let high_low = curr.high - curr.low;
            let high_close = (curr.high - prev.close).abs();
            let low_close = (curr.low - prev.close).abs();
            high_low.max(high_close).max(low_close)
        })
        .collect();

    Some(mean(&true_ranges[true_ranges.len() - period..]))
}

/// Support and resistance levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: f64,
    pub resistance: f64,
}

/// Highest high and lowest low over the last `lookback` candles
/// (or the whole series when it is shorter).
pub fn support_resistance(candles: &[Candle], lookback: usize) -> Option<SupportResistance> {
    let lookback = lookback.min(candles.len());
    if lookback == 0 {
        return None;
    }

    let recent = &candles[candles.len() - lookback..];
    let resistance = recent.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let support = recent.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);

    Some(SupportResistance { support, resistance })
}

/// Percentage change from the first to the last close
pub fn price_change_percent(candles: &[Candle]) -> Option<f64> {
    if candles.len() < 2 {
        return None;
    }

    let first = candles.first()?.close;
    let last = candles.last()?.close;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first * 100.0)
}

/// Average volume of the last `period` candles
pub fn volume_sma(candles: &[Candle], period: usize) -> Option<f64> {
    if period == 0 || candles.len() < period {
        return None;
    }

    let total: f64 = candles[candles.len() - period..]
        .iter()
        .map(|c| c.volume as f64)
        .sum();
    Some(total / period as f64)
}
