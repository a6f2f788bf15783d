//! Per-symbol analysis, parallel batches and portfolio correlation.
//!
//! The pipeline for one symbol is: load → normalize → trim to period →
//! resample → dispatch indicators. Symbols are independent, so batches run
//! on the rayon pool and come back in input order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

use pricelab_core::correlation::{correlate, CorrelationError, CorrelationMatrix};
use pricelab_core::data::{resample, BarSource, DuplicatePolicy};
use pricelab_core::dispatch::{dispatch_kinds, AugmentedSeries};
use pricelab_core::domain::{Interval, Period, Series};

use crate::config::AnalysisConfig;
use crate::data_loader::{load_series, LoadError};

/// Current schema version for persisted analysis artifacts.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("data error: {0}")]
    Load(#[from] LoadError),

    #[error("correlation error: {0}")]
    Correlation(#[from] CorrelationError),
}

/// Indicators for one symbol plus the settings that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolAnalysis {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub period: Period,
    pub interval: Interval,
    /// Bars whose high/low do not bracket open and close. Reported, not
    /// removed.
    pub insane_bars: usize,
    pub augmented: AugmentedSeries,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl SymbolAnalysis {
    pub fn bar_count(&self) -> usize {
        self.augmented.series.len()
    }
}

/// Run the indicator pipeline on an already-normalized series.
pub fn analyze_series(series: &Series, config: &AnalysisConfig) -> SymbolAnalysis {
    let windowed = series.last_period(config.period);
    let resampled = resample(&windowed, config.interval);
    let insane_bars = resampled.bars().iter().filter(|b| !b.is_sane()).count();
    let augmented = dispatch_kinds(&resampled, &config.indicator_kinds(), &config.params);

    info!(
        symbol = series.symbol(),
        bars = resampled.len(),
        indicators = augmented.indicators.len(),
        "analyzed"
    );

    SymbolAnalysis {
        schema_version: SCHEMA_VERSION,
        symbol: series.symbol().to_string(),
        period: config.period,
        interval: config.interval,
        insane_bars,
        augmented,
    }
}

/// Load one symbol from `source` and analyze it.
pub fn analyze_symbol(
    source: &dyn BarSource,
    symbol: &str,
    config: &AnalysisConfig,
) -> Result<SymbolAnalysis, AnalysisError> {
    let series = load_series(source, symbol, config.duplicates)?;
    Ok(analyze_series(&series, config))
}

/// Analyze many symbols in parallel. One result per symbol, in input order.
pub fn analyze_batch(
    source: &dyn BarSource,
    symbols: &[String],
    config: &AnalysisConfig,
) -> Vec<Result<SymbolAnalysis, AnalysisError>> {
    symbols
        .par_iter()
        .map(|symbol| analyze_symbol(source, symbol, config))
        .collect()
}

/// Skip reason for a ticker that loaded but has nothing to correlate.
pub const NO_BARS_IN_PERIOD: &str = "no bars in period";

/// A ticker left out of a portfolio correlation, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTicker {
    pub symbol: String,
    pub reason: String,
}

/// Correlation matrix plus the tickers that could not be loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioCorrelation {
    pub matrix: CorrelationMatrix,
    pub skipped: Vec<SkippedTicker>,
}

/// Load every ticker, trim to `period` and correlate the survivors.
///
/// Tickers that fail to load or normalize, or that have no bars inside
/// `period`, are skipped with a warning.
///
/// # Errors
/// `AnalysisError::Correlation` when fewer than two tickers survive or they
/// share fewer than two timestamps.
pub fn correlate_portfolio(
    source: &dyn BarSource,
    tickers: &[String],
    period: Period,
    policy: DuplicatePolicy,
) -> Result<PortfolioCorrelation, AnalysisError> {
    let loaded: Vec<(String, Result<Series, LoadError>)> = tickers
        .par_iter()
        .map(|ticker| (ticker.clone(), load_series(source, ticker, policy)))
        .collect();

    let mut series_by_symbol = BTreeMap::new();
    let mut skipped = Vec::new();
    for (symbol, result) in loaded {
        match result {
            Ok(series) => {
                let windowed = series.last_period(period);
                if windowed.is_empty() {
                    warn!(symbol = %symbol, "skipping ticker with no bars in period");
                    skipped.push(SkippedTicker {
                        symbol,
                        reason: NO_BARS_IN_PERIOD.to_string(),
                    });
                } else {
                    series_by_symbol.insert(symbol, windowed);
                }
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping ticker");
                skipped.push(SkippedTicker {
                    symbol,
                    reason: e.to_string(),
                });
            }
        }
    }

    let matrix = correlate(&series_by_symbol)?;
    info!(
        instruments = matrix.len(),
        observations = matrix.observations,
        skipped = skipped.len(),
        "portfolio correlated"
    );
    Ok(PortfolioCorrelation { matrix, skipped })
}
