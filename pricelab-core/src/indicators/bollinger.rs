//! Bollinger Bands: moving average +/- k standard deviations.
//!
//! - Middle: SMA(close, window)
//! - Upper: middle + k * stddev(close, window)
//! - Lower: middle - k * stddev(close, window)
//!
//! Uses sample stddev (divide by N - 1) over the same window as the mean.
//! All three bands are undefined wherever the stddev is, so a window of 1
//! produces no bands at all.
//! Lookback: window - 1.

use serde::{Deserialize, Serialize};

use super::indicator::{Indicator, IndicatorResult};
use super::note_insufficient;
use super::rolling::{rolling_mean, rolling_std};
use crate::dispatch::IndicatorKind;
use crate::domain::Series;

/// Conventional band width multiplier.
pub const DEFAULT_K: f64 = 2.0;

/// Which band of the Bollinger Bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Middle,
    Lower,
}

impl BollingerBand {
    pub const ALL: [BollingerBand; 3] = [
        BollingerBand::Upper,
        BollingerBand::Middle,
        BollingerBand::Lower,
    ];

    pub fn field_name(&self) -> &'static str {
        match self {
            BollingerBand::Upper => "BB_upper",
            BollingerBand::Middle => "BB_middle",
            BollingerBand::Lower => "BB_lower",
        }
    }
}

/// The three band sequences, aligned with the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

impl BollingerBands {
    pub fn band(&self, band: BollingerBand) -> &[Option<f64>] {
        match band {
            BollingerBand::Upper => &self.upper,
            BollingerBand::Middle => &self.middle,
            BollingerBand::Lower => &self.lower,
        }
    }
}

/// Bollinger Bands of `close`; undefined wherever the mean or std is.
pub fn bollinger_bands(close: &[f64], window: usize, k: f64) -> BollingerBands {
    let middle = rolling_mean(close, window);
    let dev = rolling_std(close, window);

    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(&dev)
            .map(|(m, d)| {
                let value = m.as_ref()? + sign * k * d.as_ref()?;
                value.is_finite().then_some(value)
            })
            .collect()
    };
    let upper = band(1.0);
    let lower = band(-1.0);
    let middle = middle
        .iter()
        .zip(&dev)
        .map(|(m, d)| d.and(*m))
        .collect();

    BollingerBands {
        upper,
        middle,
        lower,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bollinger {
    window: usize,
    k: f64,
}

impl Bollinger {
    pub fn new(window: usize, k: f64) -> Self {
        Self { window, k }
    }
}

impl Indicator for Bollinger {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::BollingerBands
    }

    fn lookback(&self) -> usize {
        self.window.saturating_sub(1)
    }

    fn compute(&self, series: &Series) -> IndicatorResult {
        note_insufficient(series, self);
        let bands = bollinger_bands(&series.closes(), self.window, self.k);
        let mut result = IndicatorResult::new();
        for band in BollingerBand::ALL {
            result.insert(band.field_name(), bands.band(band).to_vec());
        }
        result
    }
}
