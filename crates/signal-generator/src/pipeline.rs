use analysis_core::{Candle, IndicatorSnapshot, PriceActionResult, Prediction, SignalConfig, SignalOutcome};
use price_predictor::predict;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use technical_analysis::{analyze_price_action, compute_indicators};

use crate::generator::SignalGenerator;

/// Every intermediate result of one analysis, plus the outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub symbol: String,
    pub indicators: IndicatorSnapshot,
    pub price_action: Option<PriceActionResult>,
    pub prediction: Option<Prediction>,
    pub outcome: SignalOutcome,
}

/// One symbol's candles and optional sentiment for a batch run
#[derive(Debug, Clone)]
pub struct BatchInput {
    pub symbol: String,
    pub candles: Vec<Candle>,
    pub sentiment: Option<f64>,
}

/// Indicators, price action, prediction, then the signal decision.
pub fn analyze_candles(
    symbol: &str,
    candles: &[Candle],
    sentiment: Option<f64>,
    config: &SignalConfig,
) -> PipelineOutput {
    let indicators = compute_indicators(candles, config);
    let price_action = analyze_price_action(candles);
    let prediction = predict(candles, &indicators, sentiment, config);

    let outcome = SignalGenerator::new(config.clone()).evaluate_with_price_action(
        symbol,
        candles,
        &indicators,
        price_action.as_ref(),
        sentiment,
        prediction.map(|p| p.direction),
        None,
    );

    PipelineOutput {
        symbol: symbol.to_string(),
        indicators,
        price_action,
        prediction,
        outcome,
    }
}

/// Run independent symbols in parallel. Output order matches `inputs`.
pub fn analyze_batch(inputs: &[BatchInput], config: &SignalConfig) -> Vec<PipelineOutput> {
    inputs
        .par_iter()
        .map(|input| analyze_candles(&input.symbol, &input.candles, input.sentiment, config))
        .collect()
}
