use analysis_core::stats::{linear_regression_slope, percent_returns, population_std_dev};
use analysis_core::Prediction;

/// Default number of closes the trend model fits
pub const DEFAULT_LOOKBACK: usize = 20;

/// Confidence reported for a window with no volatility
const FLAT_CONFIDENCE: f64 = 0.5;

/// Slope-over-volatility trend model.
///
/// Fits a least-squares line through the last `lookback` prices and scales the
/// slope by the population σ of the percentage returns inside that window.
/// Needs `lookback + 1` prices and a lookback of at least two.
pub fn predict_next_move(prices: &[f64], lookback: usize) -> Option<Prediction> {
    if lookback < 2 || prices.len() < lookback + 1 {
        return None;
    }

    let recent = &prices[prices.len() - lookback..];
    let slope = linear_regression_slope(recent);
    let volatility = population_std_dev(&percent_returns(recent)?);

    if volatility > 0.0 {
        let confidence = slope.abs() / (volatility + 1e-4) / 10.0;
        Some(Prediction {
            direction: (slope / volatility).tanh(),
            confidence: confidence.min(1.0),
        })
    } else {
        Some(Prediction {
            direction: 0.0,
            confidence: FLAT_CONFIDENCE,
        })
    }
}
