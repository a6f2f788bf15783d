//! Bar source trait and raw input records.
//!
//! The `BarSource` trait is the seam to whatever acquires market data
//! (CSV exports, a vendor API, test fixtures). Sources hand back unvalidated
//! `RawBar`s; the normalizer turns them into a `Series`.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use super::csv_import::CsvError;
use crate::domain::Bar;

/// One unvalidated input record. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub timestamp: Option<NaiveDateTime>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl From<&Bar> for RawBar {
    fn from(bar: &Bar) -> Self {
        Self {
            timestamp: Some(bar.timestamp),
            open: Some(bar.open),
            high: Some(bar.high),
            low: Some(bar.low),
            close: Some(bar.close),
            volume: bar.volume,
        }
    }
}

/// Structured error types for bar sources.
///
/// These are designed to be displayable in both CLI and UI contexts.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("cannot read data for '{symbol}': {reason}")]
    Io { symbol: String, reason: String },

    #[error("malformed data for '{symbol}': {source}")]
    Malformed {
        symbol: String,
        #[source]
        source: CsvError,
    },
}

/// Trait for bar sources (CSV directory, vendor API, in-memory fixtures).
///
/// Implementations handle the specifics of one data origin. Fetch policy
/// (retries, rate limits) belongs to the implementation, not to callers.
pub trait BarSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Load every available raw bar for `symbol`, in whatever order the
    /// origin stores them.
    fn load(&self, symbol: &str) -> Result<Vec<RawBar>, SourceError>;
}

/// In-memory source, keyed by symbol. Useful for tests and for callers that
/// already hold bars.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    bars: HashMap<String, Vec<RawBar>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<RawBar>) {
        self.bars.insert(symbol.into(), bars);
    }

    pub fn with(mut self, symbol: impl Into<String>, bars: Vec<RawBar>) -> Self {
        self.insert(symbol, bars);
        self
    }
}

impl BarSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self, symbol: &str) -> Result<Vec<RawBar>, SourceError> {
        self.bars
            .get(symbol)
            .cloned()
            .ok_or_else(|| SourceError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_series;

    #[test]
    fn raw_bar_from_bar_keeps_every_field() {
        let series = make_series(&[10.0]);
        let raw = RawBar::from(&series.bars()[0]);
        assert_eq!(raw.close, Some(10.0));
        assert_eq!(raw.timestamp, series.first_timestamp());
        assert_eq!(raw.volume, Some(1000.0));
    }

    #[test]
    fn memory_source_reports_unknown_symbol() {
        let source = MemorySource::new().with("SPY", make_series(&[1.0, 2.0]).to_raw());
        assert_eq!(source.load("SPY").unwrap().len(), 2);
        let err = source.load("QQQ").unwrap_err();
        assert!(matches!(err, SourceError::SymbolNotFound { ref symbol } if symbol == "QQQ"));
    }
}
