//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a trailing window.
//! Lookback: window - 1 (first defined value at index window-1).

use super::indicator::{Indicator, IndicatorResult};
use super::note_insufficient;
use super::rolling::rolling_mean;
use crate::dispatch::IndicatorKind;
use crate::domain::Series;

/// `SMA(close, w) = rolling_mean(close, w)`.
pub fn sma(close: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling_mean(close, window)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sma {
    window: usize,
}

impl Sma {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Output field name, e.g. `SMA20`.
    pub fn field_name(&self) -> String {
        format!("SMA{}", self.window)
    }
}

impl Indicator for Sma {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Sma
    }

    fn lookback(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn compute(&self, series: &Series) -> IndicatorResult {
        note_insufficient(series, self);
        let mut result = IndicatorResult::new();
        result.insert(self.field_name(), sma(&series.closes(), self.window));
        result
    }
}
