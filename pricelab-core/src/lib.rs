//! PriceLab Core: bar normalization, rolling indicators, dispatch and correlation.
//!
//! This crate is the pure computation layer:
//! - Domain types (bars, series, periods, intervals)
//! - Series normalizer: schema checks, ordering, duplicate-timestamp policy
//! - Rolling engine: trailing mean, trailing sample std, exponential mean
//! - Derived indicators: SMA, EMA, RSI, Bollinger Bands
//! - Indicator request dispatcher over a closed name vocabulary
//! - Multi-series correlation of close-to-close returns
//!
//! Everything here is synchronous and side-effect free apart from the CSV
//! reader, which works on any `std::io::Read`.

pub mod correlation;
pub mod data;
pub mod dispatch;
pub mod domain;
pub mod indicators;

pub use correlation::{correlate, pct_returns, pearson, CorrelationError, CorrelationMatrix};
pub use data::{normalize, DuplicatePolicy, NormalizeError, RawBar};
pub use dispatch::{
    compute_indicator, dispatch, dispatch_kinds, dispatch_with, parse_indicator_names,
    AugmentedSeries, IndicatorKind, IndicatorParams, IndicatorRecord,
};
pub use domain::{Bar, Interval, Period, Series, Symbol};
pub use indicators::{ewm_mean, rolling_mean, rolling_std, IndicatorResult};
