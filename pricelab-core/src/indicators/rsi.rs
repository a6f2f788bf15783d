//! Relative Strength Index (RSI).
//!
//! Simple-average variant: average gain and average loss are trailing
//! `rolling_mean`s of the per-bar gains and losses (not Wilder smoothing).
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! The first bar has no prior close and counts as zero gain and zero loss.
//! Lookback: window - 1.
//! Edge cases: avg_loss == 0 with gains → 100; no movement at all → 50.

use super::indicator::{Indicator, IndicatorResult};
use super::note_insufficient;
use super::rolling::rolling_mean;
use crate::dispatch::IndicatorKind;
use crate::domain::Series;

/// RSI reported for a window with neither gains nor losses.
pub const FLAT_MARKET_RSI: f64 = 50.0;

/// Output field name.
pub const RSI_FIELD: &str = "RSI";

/// RSI over a trailing window of `window` close-to-close changes.
///
/// A change involving a non-finite close is undefined, and so is every
/// window that contains it.
pub fn rsi(close: &[f64], window: usize) -> Vec<Option<f64>> {
    if close.is_empty() {
        return Vec::new();
    }

    let deltas: Vec<Option<f64>> = std::iter::once(Some(0.0))
        .chain(close.windows(2).map(|w| Some(w[1] - w[0])))
        .map(|d| d.filter(|v| v.is_finite()))
        .collect();
    let gains: Vec<Option<f64>> = deltas.iter().map(|d| d.map(|v| v.max(0.0))).collect();
    let losses: Vec<Option<f64>> = deltas.iter().map(|d| d.map(|v| (-v).max(0.0))).collect();

    let avg_gain = rolling_mean(&gains, window);
    let avg_loss = rolling_mean(&losses, window);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(g, l)| Some(rsi_from_averages(g?, l?)).filter(|v| v.is_finite()))
        .collect()
}

/// Map average gain/loss to RSI, special-casing division by zero.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            FLAT_MARKET_RSI
        } else {
            100.0
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rsi {
    window: usize,
}

impl Rsi {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Indicator for Rsi {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Rsi
    }

    fn lookback(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn compute(&self, series: &Series) -> IndicatorResult {
        note_insufficient(series, self);
        let mut result = IndicatorResult::new();
        result.insert(RSI_FIELD, rsi(&series.closes(), self.window));
        result
    }
}
