//! PriceLab Runner: analysis orchestration, batch runs, portfolio correlation, export.
//!
//! This crate builds on `pricelab-core` to provide:
//! - TOML analysis configuration with validation
//! - Bar loading from a directory of per-symbol CSV files
//! - Portfolio ticker files
//! - Single-symbol and parallel batch indicator analysis
//! - Portfolio correlation that skips unloadable tickers
//! - JSON, CSV and Markdown export

pub mod analysis;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod portfolio;

pub use analysis::{
    analyze_batch, analyze_series, analyze_symbol, correlate_portfolio, AnalysisError,
    PortfolioCorrelation, SkippedTicker, SymbolAnalysis, NO_BARS_IN_PERIOD, SCHEMA_VERSION,
};
pub use config::{AnalysisConfig, ConfigError};
pub use data_loader::{load_series, CsvDirectorySource, LoadError};
pub use portfolio::{load_portfolio, parse_portfolio};
