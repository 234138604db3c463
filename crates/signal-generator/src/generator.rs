use analysis_core::{
    Candle, IndicatorSnapshot, PriceActionResult, ScoringScheme, SignalConfig, SignalOutcome, SignalType,
    TradeSignal,
};
use chrono::Utc;
use technical_analysis::analyze_price_action;

use crate::risk::{effective_atr, risk_levels};
use crate::scoring::{Factor, FactorScores};

/// Number of factors named in the reasoning text
const REASONING_TOP_FACTORS: usize = 3;

/// Direction and confidence before the threshold check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub signal_type: SignalType,
    pub confidence: f64,
}

/// Folds factor scores into a trade signal. Holds configuration only.
#[derive(Debug, Clone, Default)]
pub struct SignalGenerator {
    config: SignalConfig,
}

impl SignalGenerator {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Score every factor for the latest candle and decide.
    ///
    /// `sentiment` and `prediction` are directional inputs in [-1, 1];
    /// `atr_override` replaces the snapshot ATR for stop sizing when positive.
    pub fn evaluate(
        &self,
        symbol: &str,
        candles: &[Candle],
        indicators: &IndicatorSnapshot,
        sentiment: Option<f64>,
        prediction: Option<f64>,
        atr_override: Option<f64>,
    ) -> SignalOutcome {
        let price_action = analyze_price_action(candles);
        self.evaluate_with_price_action(
            symbol,
            candles,
            indicators,
            price_action.as_ref(),
            sentiment,
            prediction,
            atr_override,
        )
    }

    /// Same as [`evaluate`](Self::evaluate) with price action already computed.
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate_with_price_action(
        &self,
        symbol: &str,
        candles: &[Candle],
        indicators: &IndicatorSnapshot,
        price_action: Option<&PriceActionResult>,
        sentiment: Option<f64>,
        prediction: Option<f64>,
        atr_override: Option<f64>,
    ) -> SignalOutcome {
        let last = match candles.last() {
            Some(last) if candles.len() >= self.config.min_candles => last,
            _ => {
                return SignalOutcome::InsufficientData {
                    candles: candles.len(),
                    required: self.config.min_candles,
                }
            }
        };

        let entry_price = last.close;
        let scores = FactorScores::compute(
            entry_price,
            indicators,
            price_action,
            sentiment,
            prediction,
            &self.config,
        );
        let decision = self.decide(&scores);

        if decision.confidence < self.config.confidence_threshold {
            tracing::debug!(
                "{} {} suppressed: confidence {:.1} below threshold {:.1}",
                symbol,
                decision.signal_type,
                decision.confidence,
                self.config.confidence_threshold
            );
            return SignalOutcome::BelowThreshold {
                signal_type: decision.signal_type,
                confidence: decision.confidence,
                threshold: self.config.confidence_threshold,
            };
        }

        let atr = effective_atr(entry_price, indicators, candles, atr_override, &self.config.risk);
        let levels = risk_levels(
            decision.signal_type,
            entry_price,
            atr,
            price_action.map(|pa| pa.trend_type),
            &self.config.risk,
        );

        SignalOutcome::Signal(TradeSignal {
            symbol: symbol.to_string(),
            signal_type: decision.signal_type,
            confidence: decision.confidence,
            entry_price,
            stop_loss: levels.stop_loss,
            take_profit: levels.take_profit,
            reasoning: build_reasoning(symbol, &decision, &scores, price_action),
            indicators_used: self.indicators_used(&scores),
            timestamp: Utc::now(),
        })
    }

    /// Aggregate factor scores under the configured scheme.
    pub fn decide(&self, scores: &FactorScores) -> Decision {
        match self.config.scheme {
            ScoringScheme::Weighted => self.decide_weighted(scores),
            ScoringScheme::AiFirst => self.decide_ai_first(scores),
        }
    }

    fn decide_weighted(&self, scores: &FactorScores) -> Decision {
        let w = &self.config.weights;
        let confidence = (w.rsi * scores.get(Factor::Rsi)
            + w.macd * scores.get(Factor::Macd)
            + w.price_action * scores.get(Factor::PriceAction)
            + w.moving_average * scores.get(Factor::MovingAverage)
            + w.bollinger * scores.get(Factor::Bollinger)
            + w.sentiment * scores.get(Factor::Sentiment)
            + w.prediction * scores.get(Factor::Prediction))
        .clamp(0.0, 100.0);

        Decision {
            signal_type: classify(confidence),
            confidence,
        }
    }

    fn decide_ai_first(&self, scores: &FactorScores) -> Decision {
        let w = &self.config.ai_first_weights;
        let ai = scores.get(Factor::Prediction);
        let technical = scores.technical_average();
        let news = scores.get(Factor::Sentiment);

        let confidence = (w.prediction * ai + w.technical * technical + w.sentiment * news).clamp(0.0, 100.0);

        // The prediction leads unless the technicals clearly disagree
        let signal_type = if ai > 60.0 {
            if technical < 40.0 {
                SignalType::Hold
            } else {
                SignalType::Buy
            }
        } else if ai < 40.0 {
            if technical > 60.0 {
                SignalType::Hold
            } else {
                SignalType::Sell
            }
        } else {
            classify(technical)
        };

        Decision {
            signal_type,
            confidence,
        }
    }

    fn indicators_used(&self, scores: &FactorScores) -> Vec<String> {
        let mut used: Vec<Factor> = scores.present().collect();
        if self.config.scheme == ScoringScheme::AiFirst {
            if let Some(pos) = used.iter().position(|f| *f == Factor::Prediction) {
                let prediction = used.remove(pos);
                used.insert(0, prediction);
            }
        }
        used.iter().map(|f| f.label().to_string()).collect()
    }
}

/// > 60 BUY, < 40 SELL, otherwise HOLD
fn classify(score: f64) -> SignalType {
    if score > 60.0 {
        SignalType::Buy
    } else if score < 40.0 {
        SignalType::Sell
    } else {
        SignalType::Hold
    }
}

fn build_reasoning(
    symbol: &str,
    decision: &Decision,
    scores: &FactorScores,
    price_action: Option<&PriceActionResult>,
) -> String {
    let mut parts = vec![
        format!("{} signal for {}", decision.signal_type, symbol),
        format!("Confidence: {:.1}%", decision.confidence),
    ];

    let top = scores.strongest(REASONING_TOP_FACTORS);
    if !top.is_empty() {
        let factors: Vec<String> = top
            .iter()
            .map(|s| format!("{} {:.0}", s.factor.label(), s.score))
            .collect();
        parts.push(format!("Top factors: {}", factors.join(", ")));
    }

    parts.push(format!(
        "RSI:{:.0} MACD:{:.0} MA:{:.0}",
        scores.get(Factor::Rsi),
        scores.get(Factor::Macd),
        scores.get(Factor::MovingAverage)
    ));

    if let Some(pa) = price_action {
        parts.push(format!("Trend: {}", pa.trend_type.as_str().to_uppercase()));
        if !pa.patterns.is_empty() {
            let patterns: Vec<&str> = pa.patterns.iter().map(|p| p.as_str()).collect();
            parts.push(format!("Patterns: {}", patterns.join(", ")));
        }
    }

    parts.join(" | ")
}

/// Evaluate with the default configuration, collapsing every non-signal
/// outcome to `None`.
pub fn generate_signal(
    symbol: &str,
    candles: &[Candle],
    indicators: &IndicatorSnapshot,
    sentiment: Option<f64>,
    prediction: Option<f64>,
    atr_override: Option<f64>,
) -> Option<TradeSignal> {
    SignalGenerator::default()
        .evaluate(symbol, candles, indicators, sentiment, prediction, atr_override)
        .into_signal()
}
