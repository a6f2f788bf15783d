//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1],
//! alpha = 2 / (span + 1), seeded with the first close. No warmup region.

use super::indicator::{Indicator, IndicatorResult};
use super::note_insufficient;
use super::rolling::ewm_mean;
use crate::dispatch::IndicatorKind;
use crate::domain::Series;

/// `EMA(close, span) = ewm_mean(close, span)`.
pub fn ema(close: &[f64], span: usize) -> Vec<Option<f64>> {
    ewm_mean(close, span)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ema {
    span: usize,
}

impl Ema {
    pub fn new(span: usize) -> Self {
        Self { span }
    }

    /// Output field name, e.g. `EMA20`.
    pub fn field_name(&self) -> String {
        format!("EMA{}", self.span)
    }
}

impl Indicator for Ema {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::Ema
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, series: &Series) -> IndicatorResult {
        note_insufficient(series, self);
        let mut result = IndicatorResult::new();
        result.insert(self.field_name(), ema(&series.closes(), self.span));
        result
    }
}
