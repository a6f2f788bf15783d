//! Multi-series correlation engine.
//!
//! Inner-joins the input series on timestamp, converts aligned closes to
//! simple percentage returns and computes pairwise Pearson correlation of
//! the return vectors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::data::align_inner;
use crate::domain::{Series, Symbol};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    #[error(
        "correlation needs at least 2 instruments sharing at least 2 timestamps \
         (got {instruments} instruments, {shared_timestamps} shared timestamps)"
    )]
    InsufficientSeries {
        instruments: usize,
        shared_timestamps: usize,
    },
}

/// Symmetric correlation matrix over instruments in sorted order.
///
/// `values[i][j]` is the correlation of `instruments[i]` with
/// `instruments[j]`; `None` where undefined (zero variance, or fewer than two
/// paired returns).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub instruments: Vec<Symbol>,
    pub values: Vec<Vec<Option<f64>>>,
    /// Number of aligned timestamps the returns were computed from.
    pub observations: usize,
}

impl CorrelationMatrix {
    pub fn index_of(&self, instrument: &str) -> Option<usize> {
        self.instruments.iter().position(|s| s == instrument)
    }

    /// Correlation between two instruments; `None` if either is unknown or
    /// the coefficient is undefined.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        self.values[i][j]
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

/// `r[i] = (close[i] - close[i-1]) / close[i-1]`; `r[0]` is undefined, as is
/// any return off a zero or non-finite previous close.
pub fn pct_returns(closes: &[f64]) -> Vec<Option<f64>> {
    if closes.is_empty() {
        return Vec::new();
    }
    std::iter::once(None)
        .chain(closes.windows(2).map(|w| {
            let (prev, cur) = (w[0], w[1]);
            if prev == 0.0 {
                return None;
            }
            Some((cur - prev) / prev).filter(|r| r.is_finite())
        }))
        .collect()
}

/// Pearson correlation over the pairwise-complete observations of `x` and
/// `y`. Undefined with fewer than two pairs or zero variance on either side.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    if is_constant(pairs.iter().map(|p| p.0)) || is_constant(pairs.iter().map(|p| p.1)) {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for &(a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}

fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

/// Correlate the close-to-close returns of every instrument pair.
///
/// # Errors
/// `InsufficientSeries` with fewer than 2 instruments, or fewer than 2
/// timestamps shared by all of them.
pub fn correlate(
    series_by_instrument: &BTreeMap<Symbol, Series>,
) -> Result<CorrelationMatrix, CorrelationError> {
    let aligned = align_inner(series_by_instrument);
    let instruments = series_by_instrument.len();
    if instruments < 2 || aligned.len() < 2 {
        return Err(CorrelationError::InsufficientSeries {
            instruments,
            shared_timestamps: aligned.len(),
        });
    }

    let symbols: Vec<Symbol> = aligned.symbols().map(str::to_string).collect();
    let returns: Vec<Vec<Option<f64>>> = aligned
        .closes
        .values()
        .map(|closes| pct_returns(closes))
        .collect();

    let n = symbols.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        // Self-correlation is 1.0 only when the returns actually vary.
        values[i][i] = pearson(&returns[i], &returns[i]).map(|_| 1.0);
        for j in (i + 1)..n {
            let r = pearson(&returns[i], &returns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        instruments: symbols,
        values,
        observations: aligned.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_series};

    fn named(symbol: &str, closes: &[f64]) -> Series {
        let base = make_series(closes);
        Series::from_sorted(symbol.to_string(), base.bars().to_vec())
    }

    fn portfolio(entries: &[(&str, &[f64])]) -> BTreeMap<Symbol, Series> {
        entries
            .iter()
            .map(|(sym, closes)| (sym.to_string(), named(sym, closes)))
            .collect()
    }

    #[test]
    fn pct_returns_leading_undefined() {
        let r = pct_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r[0], None);
        assert_approx(r[1].unwrap(), 0.1, 1e-12);
        assert_approx(r[2].unwrap(), -0.1, 1e-12);
        assert!(pct_returns(&[]).is_empty());
    }

    #[test]
    fn pct_returns_zero_previous_close_is_undefined() {
        let r = pct_returns(&[0.0, 1.0, 2.0]);
        assert_eq!(r[1], None);
        assert_approx(r[2].unwrap(), 1.0, 1e-12);
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let x = [Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let y = [Some(2.0), Some(4.0), Some(6.0), Some(8.0)];
        let z = [Some(4.0), Some(3.0), Some(2.0), Some(1.0)];
        assert_approx(pearson(&x, &y).unwrap(), 1.0, 1e-12);
        assert_approx(pearson(&x, &z).unwrap(), -1.0, 1e-12);
    }

    #[test]
    fn pearson_skips_incomplete_pairs() {
        let x = [None, Some(1.0), Some(2.0), Some(100.0), Some(3.0)];
        let y = [Some(5.0), Some(1.0), Some(2.0), None, Some(3.0)];
        assert_approx(pearson(&x, &y).unwrap(), 1.0, 1e-12);
    }

    #[test]
    fn pearson_zero_variance_is_undefined() {
        let x = [Some(1.0), Some(1.0), Some(1.0)];
        let y = [Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(pearson(&x, &y), None);
        assert_eq!(pearson(&[Some(1.0)], &[Some(2.0)]), None);
    }

    #[test]
    fn scaled_series_correlate_perfectly() {
        let a = [100.0, 102.0, 101.0, 105.0, 104.0, 108.0];
        let b: Vec<f64> = a.iter().map(|c| c * 3.5).collect();
        let matrix = correlate(&portfolio(&[("AAA", &a), ("BBB", &b)])).unwrap();

        assert_eq!(matrix.instruments, vec!["AAA", "BBB"]);
        assert_eq!(matrix.observations, 6);
        assert_approx(matrix.get("AAA", "BBB").unwrap(), 1.0, 1e-9);
        assert_eq!(matrix.get("AAA", "AAA"), Some(1.0));
    }

    #[test]
    fn matrix_is_symmetric() {
        let a = [10.0, 11.0, 10.5, 12.0, 11.0, 13.0];
        let b = [20.0, 19.0, 21.0, 20.5, 22.0, 21.0];
        let c = [5.0, 5.5, 5.2, 5.9, 6.1, 5.8];
        let matrix = correlate(&portfolio(&[("A", &a), ("B", &b), ("C", &c)])).unwrap();
        for x in &matrix.instruments {
            for y in &matrix.instruments {
                assert_eq!(matrix.get(x, y), matrix.get(y, x));
            }
        }
        for i in 0..matrix.len() {
            for v in matrix.values[i].iter().flatten() {
                assert!((-1.0..=1.0).contains(v));
            }
        }
    }

    #[test]
    fn flat_series_has_undefined_diagonal() {
        let a = [10.0, 10.0, 10.0, 10.0];
        let b = [1.0, 2.0, 1.5, 3.0];
        let matrix = correlate(&portfolio(&[("FLAT", &a), ("MOVE", &b)])).unwrap();
        assert_eq!(matrix.get("FLAT", "FLAT"), None);
        assert_eq!(matrix.get("FLAT", "MOVE"), None);
        assert_eq!(matrix.get("MOVE", "MOVE"), Some(1.0));
    }

    #[test]
    fn single_instrument_is_insufficient() {
        let err = correlate(&portfolio(&[("ONLY", &[1.0, 2.0, 3.0])])).unwrap_err();
        assert_eq!(
            err,
            CorrelationError::InsufficientSeries {
                instruments: 1,
                shared_timestamps: 3,
            }
        );
    }

    #[test]
    fn disjoint_timestamps_are_insufficient() {
        let a = named("A", &[1.0, 2.0, 3.0]);
        let shifted: Vec<_> = a
            .bars()
            .iter()
            .map(|bar| {
                let mut bar = bar.clone();
                bar.timestamp += chrono::Duration::days(365);
                bar
            })
            .collect();
        let b = Series::from_sorted("B".to_string(), shifted);
        let map: BTreeMap<Symbol, Series> =
            [("A".to_string(), a), ("B".to_string(), b)].into_iter().collect();

        let err = correlate(&map).unwrap_err();
        assert!(matches!(
            err,
            CorrelationError::InsufficientSeries {
                instruments: 2,
                shared_timestamps: 0,
            }
        ));
        assert!(err.to_string().contains("at least 2 instruments"));
    }

    #[test]
    fn partial_overlap_uses_shared_timestamps_only() {
        let a = named("A", &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let b_full = named("B", &[10.0, 20.0, 30.0, 40.0, 50.0]);
        let b = Series::from_sorted("B".to_string(), b_full.bars()[2..].to_vec());
        let map: BTreeMap<Symbol, Series> =
            [("A".to_string(), a), ("B".to_string(), b)].into_iter().collect();

        let matrix = correlate(&map).unwrap();
        assert_eq!(matrix.observations, 3);
    }
}
