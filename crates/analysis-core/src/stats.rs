//! Small numeric helpers shared by the indicator and prediction crates.
//!
//! Everything here is population statistics (divide by `n`), which is what the
//! band and volatility calculations expect.

/// Compute the mean of a data slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Compute population standard deviation.
pub fn population_std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}

/// Slope of the least-squares line through `(i, data[i])`.
/// Returns 0.0 for fewer than two points.
pub fn linear_regression_slope(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return 0.0;
    }
    let n = data.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(data);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in data.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Simple percentage returns between consecutive points (`(b - a) / a`).
/// Returns `None` if any base price is zero.
pub fn percent_returns(data: &[f64]) -> Option<Vec<f64>> {
    data.windows(2)
        .map(|w| if w[0] == 0.0 { None } else { Some((w[1] - w[0]) / w[0]) })
        .collect()
}
