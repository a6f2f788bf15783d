//! Resample a series to a coarser interval.
//!
//! Bars are grouped by ISO week or calendar month. Because a series is
//! strictly increasing, bucket keys are non-decreasing and each bucket is a
//! contiguous run of bars.

use chrono::Datelike;

use crate::domain::{Bar, Interval, Series};

/// Aggregate `series` into `interval` buckets.
///
/// Per bucket: first open, max high, min low, last close, summed volume
/// (`None` if no bar in the bucket carries volume), first bar's timestamp.
/// `Interval::Daily` returns the series unchanged.
pub fn resample(series: &Series, interval: Interval) -> Series {
    if interval == Interval::Daily {
        return series.clone();
    }

    let mut out: Vec<Bar> = Vec::new();
    let mut current_key: Option<(i32, u32)> = None;

    for bar in series.bars() {
        let key = bucket_key(bar, interval);
        match out.last_mut() {
            Some(acc) if current_key == Some(key) => merge(acc, bar),
            _ => {
                out.push(bar.clone());
                current_key = Some(key);
            }
        }
    }

    Series::from_sorted(series.symbol().to_string(), out)
}

fn bucket_key(bar: &Bar, interval: Interval) -> (i32, u32) {
    let date = bar.timestamp.date();
    match interval {
        Interval::Weekly => {
            let week = date.iso_week();
            (week.year(), week.week())
        }
        Interval::Monthly => (date.year(), date.month()),
        Interval::Daily => (date.year(), date.ordinal()),
    }
}

fn merge(acc: &mut Bar, bar: &Bar) {
    acc.high = acc.high.max(bar.high);
    acc.low = acc.low.min(bar.low);
    acc.close = bar.close;
    acc.volume = match (acc.volume, bar.volume) {
        (Some(a), Some(b)) => Some(a + b),
        (a, b) => a.or(b),
    };
}
