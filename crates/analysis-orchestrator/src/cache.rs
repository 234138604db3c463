use analysis_core::TradeSignal;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::SymbolSnapshot;

/// Cached value with the time it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

/// Latest snapshot per symbol. Concurrent writers for the same symbol resolve
/// as last write wins.
#[derive(Debug, Default)]
pub struct SignalCache {
    entries: DashMap<String, CacheEntry<SymbolSnapshot>>,
}

impl SignalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, snapshot: SymbolSnapshot) {
        self.entries.insert(
            snapshot.symbol.clone(),
            CacheEntry {
                data: snapshot,
                cached_at: Utc::now(),
            },
        );
    }

    pub fn get(&self, symbol: &str) -> Option<SymbolSnapshot> {
        self.entries.get(symbol).map(|entry| entry.data.clone())
    }

    /// Missing symbols count as stale
    pub fn is_stale(&self, symbol: &str, max_age: Duration) -> bool {
        match self.entries.get(symbol) {
            Some(entry) => Utc::now() - entry.cached_at >= max_age,
            None => true,
        }
    }

    /// Cached symbols, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        symbols
    }

    /// Actionable signals from every cached snapshot, sorted by symbol
    pub fn signals(&self) -> Vec<TradeSignal> {
        let mut signals: Vec<TradeSignal> = self
            .entries
            .iter()
            .filter_map(|e| e.data.outcome.signal().cloned())
            .collect();
        signals.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        signals
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
