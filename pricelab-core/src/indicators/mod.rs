//! Rolling primitives and the derived indicators built on them.
//!
//! Every derived indicator implements the `Indicator` trait and also exposes
//! a plain function over a close-price slice (`sma`, `ema`, `rsi`,
//! `bollinger_bands`). Insufficient history never fails: the unfilled prefix
//! is `None`.

pub mod bollinger;
pub mod ema;
pub mod indicator;
pub mod rolling;
pub mod rsi;
pub mod sma;

pub use bollinger::{bollinger_bands, Bollinger, BollingerBand, BollingerBands};
pub use ema::{ema, Ema};
pub use indicator::{Indicator, IndicatorResult};
pub use rolling::{ewm_mean, rolling_mean, rolling_std};
pub use rsi::{rsi, rsi_from_averages, Rsi, FLAT_MARKET_RSI, RSI_FIELD};
pub use sma::{sma, Sma};

use tracing::debug;

use crate::domain::Series;

/// Log when a series is too short for an indicator to produce any value.
pub(crate) fn note_insufficient(series: &Series, indicator: &dyn Indicator) {
    let required = indicator.lookback() + 1;
    if series.len() < required {
        debug!(
            symbol = series.symbol(),
            indicator = indicator.kind().as_str(),
            required,
            actual = series.len(),
            "series shorter than indicator window; output undefined"
        );
    }
}

/// Create a synthetic series from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000,
/// one bar per calendar day from 2024-01-02.
#[cfg(test)]
pub fn make_series(closes: &[f64]) -> Series {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: Some(1000.0),
            }
        })
        .collect();
    Series::from_sorted("TEST".to_string(), bars)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
