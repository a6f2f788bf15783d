//! Series: the canonical, time-ordered bar sequence for one instrument.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::Bar;
use super::timeframe::Period;
use crate::data::source::RawBar;

/// Bars for one instrument, strictly increasing by timestamp.
///
/// The only ways to obtain a `Series` are the normalizer, deserialization
/// (which re-checks ordering) and the period/resample transforms, all of
/// which preserve the ordering invariant. A `Series` is never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesParts")]
pub struct Series {
    symbol: String,
    bars: Vec<Bar>,
}

/// Serialized shape of a `Series`, validated on the way in.
#[derive(Deserialize)]
struct SeriesParts {
    symbol: String,
    bars: Vec<Bar>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("series '{symbol}' is not strictly increasing at bar {index}")]
pub struct UnorderedSeries {
    pub symbol: String,
    pub index: usize,
}

impl TryFrom<SeriesParts> for Series {
    type Error = UnorderedSeries;

    fn try_from(parts: SeriesParts) -> Result<Self, Self::Error> {
        if let Some(pos) = parts
            .bars
            .windows(2)
            .position(|w| w[0].timestamp >= w[1].timestamp)
        {
            return Err(UnorderedSeries {
                symbol: parts.symbol,
                index: pos + 1,
            });
        }
        Ok(Series::from_sorted(parts.symbol, parts.bars))
    }
}

impl Series {
    /// Caller guarantees `bars` is strictly increasing by timestamp.
    pub(crate) fn from_sorted(symbol: String, bars: Vec<Bar>) -> Self {
        debug_assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        Self { symbol, bars }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.last().map(|b| b.timestamp)
    }

    /// Keep only bars inside `period`, measured back from the last bar.
    pub fn last_period(&self, period: Period) -> Series {
        let start = match self.last_timestamp().and_then(|last| period.start_from(last)) {
            Some(start) => start,
            None => return self.clone(),
        };
        let bars = self
            .bars
            .iter()
            .filter(|b| b.timestamp >= start)
            .cloned()
            .collect();
        Series::from_sorted(self.symbol.clone(), bars)
    }

    /// Raw records equivalent to this series, for re-normalization or export.
    pub fn to_raw(&self) -> Vec<RawBar> {
        self.bars.iter().map(RawBar::from).collect()
    }
}
