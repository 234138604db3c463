use analysis_core::{AnalysisError, BarSource, Candle};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Serves bars from a JSON array of candles on disk. The file is re-read on
/// every fetch, so edits show up on the next refresh.
pub struct JsonFileBarSource {
    path: PathBuf,
}

impl JsonFileBarSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> Result<Vec<Candle>, AnalysisError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| AnalysisError::DataSource(format!("reading {}: {}", self.path.display(), e)))?;

        serde_json::from_str(&raw)
            .map_err(|e| AnalysisError::InvalidData(format!("parsing {}: {}", self.path.display(), e)))
    }

    /// Distinct symbols in the file, sorted
    pub async fn symbols(&self) -> Result<Vec<String>, AnalysisError> {
        let candles = self.load().await?;
        let symbols: BTreeSet<String> = candles.into_iter().map(|c| c.symbol).collect();
        Ok(symbols.into_iter().collect())
    }
}

#[async_trait]
impl BarSource for JsonFileBarSource {
    async fn fetch_bars(&self, symbol: &str, limit: usize) -> Result<Vec<Candle>, AnalysisError> {
        let mut candles: Vec<Candle> = self
            .load()
            .await?
            .into_iter()
            .filter(|c| c.symbol == symbol)
            .collect();

        if candles.is_empty() {
            return Err(AnalysisError::DataSource(format!(
                "no candles for {} in {}",
                symbol,
                self.path.display()
            )));
        }

        candles.sort_by_key(|c| c.timestamp);
        let start = candles.len().saturating_sub(limit);
        Ok(candles.split_off(start))
    }
}
