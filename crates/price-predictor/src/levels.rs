use analysis_core::stats::{mean, percent_returns, population_std_dev};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Volatility bucket from the σ of recent returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityRegime {
    Low,
    Medium,
    High,
}

impl VolatilityRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolatilityRegime::Low => "Low",
            VolatilityRegime::Medium => "Medium",
            VolatilityRegime::High => "High",
        }
    }
}

impl fmt::Display for VolatilityRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the last `period` prices: σ of returns below 1% is Low, below 2.5%
/// Medium, otherwise High. Too little data reads as Medium.
pub fn volatility_regime(prices: &[f64], period: usize) -> VolatilityRegime {
    if period < 2 || prices.len() < period {
        return VolatilityRegime::Medium;
    }

    let returns = match percent_returns(&prices[prices.len() - period..]) {
        Some(returns) => returns,
        None => return VolatilityRegime::Medium,
    };
    let volatility = population_std_dev(&returns) * 100.0;

    if volatility < 1.0 {
        VolatilityRegime::Low
    } else if volatility < 2.5 {
        VolatilityRegime::Medium
    } else {
        VolatilityRegime::High
    }
}

/// Clustered swing levels: resistances highest first, supports lowest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyLevels {
    pub resistances: Vec<f64>,
    pub supports: Vec<f64>,
}

/// Levels closer than this (percent of the previous level) merge into one
const CLUSTER_THRESHOLD_PERCENT: f64 = 0.5;

/// Swing highs and lows over the last `5 * window` prices, merged into clusters.
pub fn support_resistance_clusters(prices: &[f64], window: usize) -> KeyLevels {
    if window == 0 || prices.len() < window {
        return KeyLevels::default();
    }

    let recent = &prices[prices.len().saturating_sub(window * 5)..];

    let mut peaks = Vec::new();
    let mut troughs = Vec::new();
    for w in recent.windows(3) {
        if w[1] > w[0] && w[1] > w[2] {
            peaks.push(w[1]);
        }
        if w[1] < w[0] && w[1] < w[2] {
            troughs.push(w[1]);
        }
    }

    let mut resistances = cluster_levels(peaks, CLUSTER_THRESHOLD_PERCENT);
    resistances.reverse();

    KeyLevels {
        resistances,
        supports: cluster_levels(troughs, CLUSTER_THRESHOLD_PERCENT),
    }
}

/// Sort `levels` and average runs where each step is within `threshold_percent`
/// of the previous level. Output is ascending.
fn cluster_levels(mut levels: Vec<f64>, threshold_percent: f64) -> Vec<f64> {
    levels.sort_by(|a, b| a.total_cmp(b));

    let mut clusters = Vec::new();
    let mut current: Vec<f64> = Vec::new();
    for level in levels {
        if let Some(&prev) = current.last() {
            if (level - prev).abs() > prev * threshold_percent / 100.0 {
                clusters.push(mean(&current));
                current.clear();
            }
        }
        current.push(level);
    }
    if !current.is_empty() {
        clusters.push(mean(&current));
    }

    clusters
}
