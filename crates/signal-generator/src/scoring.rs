use analysis_core::{IndicatorSnapshot, PriceActionResult, PricePattern, SignalConfig, TrendType};
use serde::{Deserialize, Serialize};
use std::fmt;
use technical_analysis::BollingerBands;

/// Score a factor reports when its input is missing
pub const NEUTRAL_SCORE: f64 = 50.0;

/// One input to the signal decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Factor {
    Rsi,
    Macd,
    MovingAverage,
    Bollinger,
    PriceAction,
    Sentiment,
    Prediction,
}

impl Factor {
    /// Every factor in reporting order
    pub const ALL: [Factor; 7] = [
        Factor::Rsi,
        Factor::Macd,
        Factor::MovingAverage,
        Factor::Bollinger,
        Factor::PriceAction,
        Factor::Sentiment,
        Factor::Prediction,
    ];

    /// Label used in `indicators_used` and reasoning text
    pub fn label(&self) -> &'static str {
        match self {
            Factor::Rsi => "RSI",
            Factor::Macd => "MACD",
            Factor::MovingAverage => "MA",
            Factor::Bollinger => "BB",
            Factor::PriceAction => "Price_Action",
            Factor::Sentiment => "News_Sentiment",
            Factor::Prediction => "AI_Prediction",
        }
    }

    /// Part of the technical average used by the prediction-led scheme
    pub fn is_technical(&self) -> bool {
        !matches!(self, Factor::Sentiment | Factor::Prediction)
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: Factor,
    /// 0 (strongly bearish) to 100 (strongly bullish)
    pub score: f64,
    /// Whether the factor's input was available
    pub present: bool,
}

impl FactorScore {
    fn present(factor: Factor, score: f64) -> Self {
        Self {
            factor,
            score: score.clamp(0.0, 100.0),
            present: true,
        }
    }

    fn neutral(factor: Factor) -> Self {
        Self {
            factor,
            score: NEUTRAL_SCORE,
            present: false,
        }
    }

    /// Non-finite inputs count as missing
    fn from_option(factor: Factor, score: Option<f64>) -> Self {
        match score.filter(|s| s.is_finite()) {
            Some(score) => Self::present(factor, score),
            None => Self::neutral(factor),
        }
    }

    /// Distance from neutral, how strongly the factor leans either way
    pub fn strength(&self) -> f64 {
        (self.score - NEUTRAL_SCORE).abs()
    }
}

/// Scores for all seven factors, in `Factor::ALL` order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    scores: Vec<FactorScore>,
}

impl FactorScores {
    pub fn compute(
        price: f64,
        indicators: &IndicatorSnapshot,
        price_action: Option<&PriceActionResult>,
        sentiment: Option<f64>,
        prediction: Option<f64>,
        config: &SignalConfig,
    ) -> Self {
        let scores = Factor::ALL
            .iter()
            .map(|&factor| {
                let score = match factor {
                    Factor::Rsi => indicators.rsi.map(|rsi| rsi_score(rsi, config)),
                    Factor::Macd => macd_score(indicators),
                    Factor::MovingAverage => moving_average_score(price, indicators),
                    Factor::Bollinger => bollinger_score(price, indicators),
                    Factor::PriceAction => price_action.map(price_action_score),
                    Factor::Sentiment => sentiment.map(|s| NEUTRAL_SCORE + 25.0 * s),
                    Factor::Prediction => prediction.map(|p| NEUTRAL_SCORE + 25.0 * p),
                };
                FactorScore::from_option(factor, score)
            })
            .collect();

        Self { scores }
    }

    pub fn get(&self, factor: Factor) -> f64 {
        self.scores
            .iter()
            .find(|s| s.factor == factor)
            .map(|s| s.score)
            .unwrap_or(NEUTRAL_SCORE)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FactorScore> {
        self.scores.iter()
    }

    /// Factors whose input was available, in reporting order
    pub fn present(&self) -> impl Iterator<Item = Factor> + '_ {
        self.scores.iter().filter(|s| s.present).map(|s| s.factor)
    }

    /// Mean of the five technical scores (absent ones count as neutral)
    pub fn technical_average(&self) -> f64 {
        let technical: Vec<f64> = self
            .scores
            .iter()
            .filter(|s| s.factor.is_technical())
            .map(|s| s.score)
            .collect();
        technical.iter().sum::<f64>() / technical.len() as f64
    }

    /// The `n` present factors leaning hardest away from neutral. Ties keep
    /// reporting order.
    pub fn strongest(&self, n: usize) -> Vec<FactorScore> {
        let mut present: Vec<FactorScore> = self.scores.iter().filter(|s| s.present).copied().collect();
        present.sort_by(|a, b| b.strength().total_cmp(&a.strength()));
        present.truncate(n);
        present
    }
}

/// Oversold reads bullish, overbought bearish
pub fn rsi_score(rsi: f64, config: &SignalConfig) -> f64 {
    if rsi < config.rsi_oversold {
        75.0
    } else if rsi < 40.0 {
        60.0
    } else if rsi > config.rsi_overbought {
        25.0
    } else if rsi > 60.0 {
        40.0
    } else {
        NEUTRAL_SCORE
    }
}

/// Needs both MACD lines; the histogram falls back to their difference.
pub fn macd_score(indicators: &IndicatorSnapshot) -> Option<f64> {
    let (macd, signal) = indicators.macd.zip(indicators.macd_signal)?;
    let histogram = indicators.macd_histogram.unwrap_or(macd - signal);

    Some(if histogram > 0.0 && macd > signal {
        65.0
    } else if histogram < 0.0 && macd < signal {
        35.0
    } else {
        NEUTRAL_SCORE
    })
}

/// Short/long SMA alignment, with a bonus when price extends the stack.
pub fn moving_average_score(price: f64, indicators: &IndicatorSnapshot) -> Option<f64> {
    let (short, long) = indicators.sma_short.zip(indicators.sma_long)?;

    let mut score = if short > long {
        60.0
    } else if short < long {
        40.0
    } else {
        NEUTRAL_SCORE
    };

    if price > short && short > long {
        score += 10.0;
    } else if price < short && short < long {
        score -= 10.0;
    }

    Some(score)
}

/// Near the upper band reads bearish, near the lower band bullish.
pub fn bollinger_score(price: f64, indicators: &IndicatorSnapshot) -> Option<f64> {
    let (upper, lower) = indicators.bollinger_upper.zip(indicators.bollinger_lower)?;
    let bands = BollingerBands {
        upper,
        middle: indicators.bollinger_middle.unwrap_or((upper + lower) / 2.0),
        lower,
    };
    let position = bands.position(price);

    Some(if position > 0.8 {
        35.0
    } else if position < 0.2 {
        65.0
    } else {
        NEUTRAL_SCORE
    })
}

pub fn price_action_score(price_action: &PriceActionResult) -> f64 {
    let mut score = NEUTRAL_SCORE;

    if price_action.is_bullish {
        score += 10.0;
    } else if price_action.is_bearish {
        score -= 10.0;
    }

    if price_action.has_pattern(PricePattern::StrongCandle) {
        if price_action.is_bullish {
            score += 15.0;
        } else if price_action.is_bearish {
            score -= 15.0;
        }
    }

    if price_action.has_pattern(PricePattern::Hammer) {
        score += 10.0;
    }
    if price_action.has_pattern(PricePattern::ShootingStar) {
        score -= 10.0;
    }

    match price_action.trend_type {
        TrendType::Uptrend => score += 10.0,
        TrendType::Downtrend => score -= 10.0,
        TrendType::Ranging => {}
    }

    score.clamp(0.0, 100.0)
}
