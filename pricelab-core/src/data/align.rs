//! Multi-symbol time alignment.
//!
//! Inner join on timestamp: only timestamps present in every series are
//! kept. No forward-fill and no partial rows, so nothing downstream can
//! pair a real price with a gap.

use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::Series;

/// Close prices for several symbols on their shared timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedCloses {
    /// Timestamps present in every input series (sorted ascending).
    pub timestamps: Vec<NaiveDateTime>,
    /// Closes per symbol; each has the same length as `timestamps`.
    pub closes: BTreeMap<String, Vec<f64>>,
}

impl AlignedCloses {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.closes.keys().map(|s| s.as_str())
    }
}

/// Align several series to the timestamps they all share.
///
/// Keys of `series_by_symbol` are the instrument identifiers used in the
/// output. An empty map aligns to an empty timeline.
pub fn align_inner(series_by_symbol: &BTreeMap<String, Series>) -> AlignedCloses {
    let mut shared: Option<BTreeSet<NaiveDateTime>> = None;
    for series in series_by_symbol.values() {
        let own: BTreeSet<NaiveDateTime> = series.bars().iter().map(|b| b.timestamp).collect();
        shared = Some(match shared {
            None => own,
            Some(acc) => acc.intersection(&own).copied().collect(),
        });
    }
    let timestamps: Vec<NaiveDateTime> = shared.unwrap_or_default().into_iter().collect();

    let closes = series_by_symbol
        .iter()
        .map(|(symbol, series)| {
            let by_time: HashMap<NaiveDateTime, f64> = series
                .bars()
                .iter()
                .map(|b| (b.timestamp, b.close))
                .collect();
            // Every shared timestamp is in every series by construction.
            let aligned = timestamps
                .iter()
                .filter_map(|ts| by_time.get(ts).copied())
                .collect();
            (symbol.clone(), aligned)
        })
        .collect();

    AlignedCloses { timestamps, closes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{normalize, DuplicatePolicy, RawBar};
    use chrono::NaiveDate;

    fn bar(date: &str, close: f64) -> RawBar {
        RawBar {
            timestamp: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(0, 0, 0),
            open: Some(close - 1.0),
            high: Some(close + 1.0),
            low: Some(close - 2.0),
            close: Some(close),
            volume: Some(1000.0),
        }
    }

    fn series(symbol: &str, bars: Vec<RawBar>) -> Series {
        normalize(symbol, bars, DuplicatePolicy::Reject).unwrap()
    }

    #[test]
    fn align_drops_dates_missing_anywhere() {
        let mut input = BTreeMap::new();
        input.insert(
            "SPY".to_string(),
            series(
                "SPY",
                vec![
                    bar("2024-01-02", 100.0),
                    bar("2024-01-03", 101.0),
                    bar("2024-01-04", 102.0),
                ],
            ),
        );
        input.insert(
            "QQQ".to_string(),
            series(
                "QQQ",
                vec![
                    bar("2024-01-02", 200.0),
                    // QQQ missing 2024-01-03
                    bar("2024-01-04", 202.0),
                    bar("2024-01-05", 203.0),
                ],
            ),
        );

        let aligned = align_inner(&input);

        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned.closes["SPY"], vec![100.0, 102.0]);
        assert_eq!(aligned.closes["QQQ"], vec![200.0, 202.0]);
        assert_eq!(aligned.symbols().collect::<Vec<_>>(), vec!["QQQ", "SPY"]);
    }

    #[test]
    fn single_symbol_keeps_everything() {
        let mut input = BTreeMap::new();
        input.insert(
            "SPY".to_string(),
            series("SPY", vec![bar("2024-01-02", 100.0), bar("2024-01-03", 101.0)]),
        );
        let aligned = align_inner(&input);
        assert_eq!(aligned.len(), 2);
        assert_eq!(aligned.closes["SPY"], vec![100.0, 101.0]);
    }

    #[test]
    fn disjoint_series_align_to_nothing() {
        let mut input = BTreeMap::new();
        input.insert("A".to_string(), series("A", vec![bar("2024-01-02", 1.0)]));
        input.insert("B".to_string(), series("B", vec![bar("2024-01-03", 2.0)]));
        let aligned = align_inner(&input);
        assert!(aligned.is_empty());
        assert!(aligned.closes.values().all(|c| c.is_empty()));
    }
}
