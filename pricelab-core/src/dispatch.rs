//! Indicator request dispatcher.
//!
//! Maps a loosely-typed list of indicator names onto the closed
//! `IndicatorKind` vocabulary, runs each selected indicator with explicit
//! parameters, and merges the outputs into one record set aligned with the
//! series. Unknown names are ignored.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Bar, Series};
use crate::indicators::{Bollinger, Ema, Indicator, IndicatorResult, Rsi, Sma};

pub const DEFAULT_SMA_WINDOW: usize = 20;
pub const DEFAULT_EMA_SPAN: usize = 20;
pub const DEFAULT_RSI_WINDOW: usize = 14;
pub const DEFAULT_BOLLINGER_WINDOW: usize = 20;
pub const DEFAULT_BOLLINGER_K: f64 = crate::indicators::bollinger::DEFAULT_K;

/// The closed indicator vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndicatorKind {
    #[serde(rename = "SMA")]
    Sma,
    #[serde(rename = "EMA")]
    Ema,
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "BollingerBands")]
    BollingerBands,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown indicator '{0}' (expected SMA, EMA, RSI or BollingerBands)")]
pub struct UnknownIndicator(pub String);

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 4] = [
        IndicatorKind::Sma,
        IndicatorKind::Ema,
        IndicatorKind::Rsi,
        IndicatorKind::BollingerBands,
    ];

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKind::Sma => "SMA",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::BollingerBands => "BollingerBands",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorKind {
    type Err = UnknownIndicator;

    /// Case-insensitive; Bollinger Bands also answers to `Bollinger`,
    /// `BBands` and `BB`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sma" => Ok(IndicatorKind::Sma),
            "ema" => Ok(IndicatorKind::Ema),
            "rsi" => Ok(IndicatorKind::Rsi),
            "bollingerbands" | "bollinger" | "bbands" | "bb" => Ok(IndicatorKind::BollingerBands),
            _ => Err(UnknownIndicator(s.to_string())),
        }
    }
}

/// Numeric parameters for every indicator in the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub sma_window: usize,
    pub ema_span: usize,
    pub rsi_window: usize,
    pub bollinger_window: usize,
    pub bollinger_k: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            sma_window: DEFAULT_SMA_WINDOW,
            ema_span: DEFAULT_EMA_SPAN,
            rsi_window: DEFAULT_RSI_WINDOW,
            bollinger_window: DEFAULT_BOLLINGER_WINDOW,
            bollinger_k: DEFAULT_BOLLINGER_K,
        }
    }
}

/// Build the indicator for `kind` from `params`.
pub fn indicator_for(kind: IndicatorKind, params: &IndicatorParams) -> Box<dyn Indicator> {
    match kind {
        IndicatorKind::Sma => Box::new(Sma::new(params.sma_window)),
        IndicatorKind::Ema => Box::new(Ema::new(params.ema_span)),
        IndicatorKind::Rsi => Box::new(Rsi::new(params.rsi_window)),
        IndicatorKind::BollingerBands => {
            Box::new(Bollinger::new(params.bollinger_window, params.bollinger_k))
        }
    }
}

/// Compute one indicator's named output sequences.
pub fn compute_indicator(
    kind: IndicatorKind,
    series: &Series,
    params: &IndicatorParams,
) -> IndicatorResult {
    indicator_for(kind, params).compute(series)
}

/// Resolve names to kinds, dropping (and logging) unknown ones.
pub fn parse_indicator_names<I, S>(names: I) -> BTreeSet<IndicatorKind>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| match name.as_ref().parse::<IndicatorKind>() {
            Ok(kind) => Some(kind),
            Err(err) => {
                debug!(%err, "ignoring unknown indicator");
                None
            }
        })
        .collect()
}

/// Run the named indicators with default parameters.
pub fn dispatch<I, S>(series: &Series, names: I) -> AugmentedSeries
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dispatch_with(series, names, &IndicatorParams::default())
}

/// Run the named indicators with explicit parameters.
pub fn dispatch_with<I, S>(series: &Series, names: I, params: &IndicatorParams) -> AugmentedSeries
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dispatch_kinds(series, &parse_indicator_names(names), params)
}

/// Run an already-resolved set of indicators.
pub fn dispatch_kinds(
    series: &Series,
    kinds: &BTreeSet<IndicatorKind>,
    params: &IndicatorParams,
) -> AugmentedSeries {
    let mut indicators = IndicatorResult::new();
    for &kind in kinds {
        indicators.merge(compute_indicator(kind, series, params));
    }
    AugmentedSeries {
        series: series.clone(),
        indicators,
    }
}

/// A series plus named indicator columns, one value per bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentedSeries {
    pub series: Series,
    pub indicators: IndicatorResult,
}

/// One output row: the bar's fields flattened together with its indicator
/// values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRecord<'a> {
    #[serde(flatten)]
    pub bar: &'a Bar,
    #[serde(flatten)]
    pub values: BTreeMap<&'a str, Option<f64>>,
}

impl AugmentedSeries {
    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }

    /// Indicator column names in stable (sorted) order.
    pub fn field_names(&self) -> Vec<&str> {
        self.indicators.names().collect()
    }

    /// First indicator column whose length differs from the bar count, with
    /// that length. `None` when every column lines up with the bars.
    pub fn misaligned_field(&self) -> Option<(&str, usize)> {
        let bars = self.series.len();
        self.indicators
            .iter()
            .find(|(_, values)| values.len() != bars)
            .map(|(name, values)| (name, values.len()))
    }

    /// Per-bar records: the bar plus every indicator value.
    pub fn records(&self) -> Vec<IndicatorRecord<'_>> {
        self.series
            .bars()
            .iter()
            .enumerate()
            .map(|(i, bar)| IndicatorRecord {
                bar,
                values: self
                    .indicators
                    .names()
                    .map(|name| (name, self.indicators.value(name, i)))
                    .collect(),
            })
            .collect()
    }
}
