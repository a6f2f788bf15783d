//! Indicator trait and named indicator output container.
//!
//! Indicators are pure functions: series in, one or more named value
//! sequences out, each aligned one-to-one with the series' bars.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dispatch::IndicatorKind;
use crate::domain::Series;

/// Trait for indicators.
///
/// `compute` returns sequences of the same length as the series. Entries
/// without enough history are `None`, never a fabricated number.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Which vocabulary entry this indicator implements.
    fn kind(&self) -> IndicatorKind;

    /// Number of leading bars that are always undefined.
    fn lookback(&self) -> usize;

    /// Compute every output sequence for the series.
    fn compute(&self, series: &Series) -> IndicatorResult;
}

/// Named indicator outputs, e.g. `"SMA20"`, `"RSI"`, `"BB_upper"`.
///
/// Names iterate in sorted order, so exports have stable columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorResult {
    series: BTreeMap<String, Vec<Option<f64>>>,
}

impl IndicatorResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a named sequence.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        self.series.insert(name.into(), values);
    }

    /// Move every sequence of `other` into `self`, replacing same-named ones.
    pub fn merge(&mut self, other: IndicatorResult) {
        self.series.extend(other.series);
    }

    /// Value at a bar index; `None` if undefined, out of bounds, or unknown.
    pub fn value(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied().flatten())
    }

    /// The full sequence for a named indicator.
    pub fn get(&self, name: &str) -> Option<&[Option<f64>]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.series.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of defined entries in a named sequence.
    pub fn defined_count(&self, name: &str) -> usize {
        self.get(name)
            .map(|v| v.iter().filter(|x| x.is_some()).count())
            .unwrap_or(0)
    }

    /// Number of named sequences stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
