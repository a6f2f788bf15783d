//! Series normalizer: structural validation, sort, duplicate policy.
//!
//! Only structural completeness is checked. A record with a missing (or NaN)
//! timestamp/open/high/low/close is a schema error; price sanity is not
//! validated. Output is strictly increasing by timestamp.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::source::RawBar;
use crate::domain::{Bar, Series};

/// What to do when two records share a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Fail with `NormalizeError::DuplicateTimestamp`.
    #[default]
    Reject,
    /// Keep the record that appears last in input order, drop the others.
    KeepLast,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    #[error("schema error for '{symbol}': record {index} is missing required field '{field}'")]
    Schema {
        symbol: String,
        index: usize,
        field: &'static str,
    },

    #[error("duplicate timestamp {timestamp} for '{symbol}'")]
    DuplicateTimestamp {
        symbol: String,
        timestamp: NaiveDateTime,
    },
}

/// Validate, sort and de-duplicate raw records into a canonical `Series`.
pub fn normalize(
    symbol: impl Into<String>,
    raw: impl IntoIterator<Item = RawBar>,
    policy: DuplicatePolicy,
) -> Result<Series, NormalizeError> {
    let symbol = symbol.into();

    let mut bars = raw
        .into_iter()
        .enumerate()
        .map(|(index, record)| to_bar(&symbol, index, record))
        .collect::<Result<Vec<_>, _>>()?;

    // Stable: records sharing a timestamp stay in input order.
    bars.sort_by_key(|b| b.timestamp);

    let mut unique: Vec<Bar> = Vec::with_capacity(bars.len());
    let mut dropped = 0usize;
    for bar in bars {
        match unique.last_mut() {
            Some(prev) if prev.timestamp == bar.timestamp => match policy {
                DuplicatePolicy::Reject => {
                    return Err(NormalizeError::DuplicateTimestamp {
                        symbol,
                        timestamp: bar.timestamp,
                    });
                }
                DuplicatePolicy::KeepLast => {
                    *prev = bar;
                    dropped += 1;
                }
            },
            _ => unique.push(bar),
        }
    }

    if dropped > 0 {
        debug!(symbol = %symbol, dropped, "dropped duplicate timestamps, kept last");
    }

    Ok(Series::from_sorted(symbol, unique))
}

fn to_bar(symbol: &str, index: usize, record: RawBar) -> Result<Bar, NormalizeError> {
    let missing = |field: &'static str| NormalizeError::Schema {
        symbol: symbol.to_string(),
        index,
        field,
    };

    let timestamp = record.timestamp.ok_or_else(|| missing("timestamp"))?;
    let open = present(record.open).ok_or_else(|| missing("open"))?;
    let high = present(record.high).ok_or_else(|| missing("high"))?;
    let low = present(record.low).ok_or_else(|| missing("low"))?;
    let close = present(record.close).ok_or_else(|| missing("close"))?;

    Ok(Bar {
        timestamp,
        open,
        high,
        low,
        close,
        volume: present(record.volume),
    })
}

/// NaN counts as missing.
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn raw(day: u32, close: f64) -> RawBar {
        RawBar {
            timestamp: Some(ts(day)),
            open: Some(close - 1.0),
            high: Some(close + 1.0),
            low: Some(close - 2.0),
            close: Some(close),
            volume: Some(1000.0),
        }
    }

    #[test]
    fn sorts_ascending_by_timestamp() {
        let series = normalize(
            "SPY",
            vec![raw(4, 103.0), raw(2, 101.0), raw(3, 102.0)],
            DuplicatePolicy::Reject,
        )
        .unwrap();
        assert_eq!(series.closes(), vec![101.0, 102.0, 103.0]);
        assert_eq!(series.first_timestamp(), Some(ts(2)));
    }

    #[test]
    fn missing_close_is_schema_error() {
        let mut bad = raw(3, 102.0);
        bad.close = None;
        let err = normalize("SPY", vec![raw(2, 101.0), bad], DuplicatePolicy::Reject).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::Schema {
                symbol: "SPY".into(),
                index: 1,
                field: "close",
            }
        );
    }

    #[test]
    fn nan_price_is_treated_as_missing() {
        let mut bad = raw(2, 101.0);
        bad.high = Some(f64::NAN);
        let err = normalize("SPY", vec![bad], DuplicatePolicy::Reject).unwrap_err();
        assert!(matches!(err, NormalizeError::Schema { field: "high", .. }));
    }

    #[test]
    fn missing_timestamp_is_schema_error() {
        let mut bad = raw(2, 101.0);
        bad.timestamp = None;
        let err = normalize("SPY", vec![bad], DuplicatePolicy::KeepLast).unwrap_err();
        assert!(matches!(err, NormalizeError::Schema { field: "timestamp", index: 0, .. }));
    }

    #[test]
    fn missing_volume_is_allowed() {
        let mut record = raw(2, 101.0);
        record.volume = None;
        let series = normalize("SPY", vec![record], DuplicatePolicy::Reject).unwrap();
        assert_eq!(series.bars()[0].volume, None);
    }

    #[test]
    fn reject_policy_fails_on_duplicates() {
        let err = normalize(
            "SPY",
            vec![raw(2, 101.0), raw(3, 102.0), raw(2, 111.0)],
            DuplicatePolicy::Reject,
        )
        .unwrap_err();
        assert_eq!(
            err,
            NormalizeError::DuplicateTimestamp {
                symbol: "SPY".into(),
                timestamp: ts(2),
            }
        );
    }

    #[test]
    fn keep_last_policy_keeps_latest_record() {
        let series = normalize(
            "SPY",
            vec![raw(2, 101.0), raw(3, 102.0), raw(2, 111.0)],
            DuplicatePolicy::KeepLast,
        )
        .unwrap();
        assert_eq!(series.closes(), vec![111.0, 102.0]);
    }

    #[test]
    fn normalizing_a_series_again_is_identity() {
        let series = normalize(
            "SPY",
            vec![raw(5, 3.0), raw(1, 1.0), raw(3, 2.0)],
            DuplicatePolicy::Reject,
        )
        .unwrap();
        let again = normalize("SPY", series.to_raw(), DuplicatePolicy::Reject).unwrap();
        assert_eq!(again, series);
    }

    #[test]
    fn empty_input_gives_empty_series() {
        let series = normalize("SPY", Vec::new(), DuplicatePolicy::Reject).unwrap();
        assert!(series.is_empty());
    }
}
