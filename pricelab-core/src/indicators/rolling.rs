//! Rolling primitives: trailing mean, trailing sample std, exponential mean.
//!
//! All three accept either `&[f64]` or `&[Option<f64>]` and return one
//! `Option<f64>` per input. Non-finite inputs (NaN, infinities) are treated
//! as undefined, and a statistic that overflows is reported as undefined, so
//! a special float never leaks into the output.
//!
//! Trailing windows are right-aligned with no look-ahead: index `i` sees
//! `values[i + 1 - w ..= i]`. A window containing an undefined input is
//! undefined. A window of 0 yields an all-undefined output.

/// Normalize an input element to `Some(finite)` / `None`.
fn defined<T: Into<Option<f64>>>(value: T) -> Option<f64> {
    value.into().filter(|v| v.is_finite())
}

/// Apply `stat` to every full trailing window.
fn trailing<T, F>(values: &[T], window: usize, stat: F) -> Vec<Option<f64>>
where
    T: Copy + Into<Option<f64>>,
    F: Fn(&[f64]) -> Option<f64>,
{
    let n = values.len();
    if window == 0 || n < window {
        return vec![None; n];
    }

    let inputs: Vec<Option<f64>> = values.iter().map(|&v| defined(v)).collect();
    let mut buf = Vec::with_capacity(window);

    (0..n)
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            buf.clear();
            for v in &inputs[i + 1 - window..=i] {
                buf.push((*v)?);
            }
            stat(&buf).filter(|v| v.is_finite())
        })
        .collect()
}

fn mean(window: &[f64]) -> Option<f64> {
    Some(window.iter().sum::<f64>() / window.len() as f64)
}

/// Sample standard deviation (divide by N - 1). Undefined for N < 2.
fn sample_std(window: &[f64]) -> Option<f64> {
    let n = window.len();
    if n < 2 {
        return None;
    }
    let m = window.iter().sum::<f64>() / n as f64;
    let var = window.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / (n - 1) as f64;
    Some(var.sqrt())
}

/// Simple moving average over a trailing window of `window` values.
///
/// The first `window - 1` entries are undefined.
pub fn rolling_mean<T>(values: &[T], window: usize) -> Vec<Option<f64>>
where
    T: Copy + Into<Option<f64>>,
{
    trailing(values, window, mean)
}

/// Sample standard deviation over a trailing window (same alignment as
/// [`rolling_mean`]). A window of 1 is always undefined.
pub fn rolling_std<T>(values: &[T], window: usize) -> Vec<Option<f64>>
where
    T: Copy + Into<Option<f64>>,
{
    trailing(values, window, sample_std)
}

/// Exponentially weighted mean, `alpha = 2 / (span + 1)`.
///
/// `ewm[first] = values[first]`, then
/// `ewm[i] = alpha * values[i] + (1 - alpha) * ewm[i - 1]`.
/// Fully defined from the first defined input. An undefined input yields an
/// undefined output at that index and the recurrence resumes from the last
/// defined value.
pub fn ewm_mean<T>(values: &[T], span: usize) -> Vec<Option<f64>>
where
    T: Copy + Into<Option<f64>>,
{
    let mut result = vec![None; values.len()];
    if span == 0 {
        return result;
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;

    for (slot, &value) in result.iter_mut().zip(values) {
        let Some(x) = defined(value) else {
            continue;
        };
        let next = match prev {
            None => x,
            Some(p) => alpha * x + (1.0 - alpha) * p,
        };
        *slot = Some(next);
        prev = Some(next);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    const CLOSES: [f64; 10] = [10.0, 11.0, 12.0, 11.0, 10.0, 9.0, 10.0, 11.0, 12.0, 13.0];

    #[test]
    fn rolling_mean_window_3() {
        let result = rolling_mean(&CLOSES, 3);
        assert_eq!(result.len(), 10);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_approx(result[2].unwrap(), 11.0, DEFAULT_EPSILON);
        assert_approx(result[9].unwrap(), 12.0, DEFAULT_EPSILON);
        assert_eq!(result.iter().filter(|v| v.is_some()).count(), 8);
    }

    #[test]
    fn rolling_mean_window_1_is_identity() {
        let result = rolling_mean(&[100.0, 200.0, 300.0], 1);
        assert_eq!(result, vec![Some(100.0), Some(200.0), Some(300.0)]);
    }

    #[test]
    fn rolling_mean_too_few_values() {
        let result = rolling_mean(&[10.0, 11.0], 5);
        assert_eq!(result, vec![None, None]);
    }

    #[test]
    fn rolling_mean_zero_window_is_undefined() {
        assert!(rolling_mean(&CLOSES, 0).iter().all(Option::is_none));
        assert!(rolling_std(&CLOSES, 0).iter().all(Option::is_none));
    }

    #[test]
    fn rolling_mean_undefined_input_poisons_its_windows() {
        let values = [Some(10.0), Some(11.0), None, Some(13.0), Some(14.0), Some(15.0)];
        let result = rolling_mean(&values, 3);
        // Windows covering index 2 are undefined.
        assert_eq!(result[2], None);
        assert_eq!(result[3], None);
        assert_eq!(result[4], None);
        assert_approx(result[5].unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn nan_input_is_undefined_not_propagated() {
        let values = [10.0, f64::NAN, 12.0, 13.0, 14.0];
        let result = rolling_mean(&values, 2);
        assert_eq!(result[1], None);
        assert_eq!(result[2], None);
        assert_approx(result[3].unwrap(), 12.5, DEFAULT_EPSILON);
        assert!(result.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn infinite_input_is_undefined_not_propagated() {
        let closes = [f64::INFINITY, 1.0, 2.0, 3.0];
        let std = rolling_std(&closes, 2);
        assert_eq!(std[0], None);
        assert_eq!(std[1], None);
        assert_approx(std[2].unwrap(), 0.5_f64.sqrt(), DEFAULT_EPSILON);

        assert_eq!(rolling_mean(&[f64::INFINITY, f64::NEG_INFINITY], 2), vec![None, None]);

        let ewm = ewm_mean(&[10.0, f64::INFINITY, 14.0], 3);
        assert_eq!(ewm[1], None);
        assert_approx(ewm[2].unwrap(), 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn overflowing_window_is_undefined() {
        let result = rolling_mean(&[f64::MAX, f64::MAX, 1.0], 2);
        assert_eq!(result[1], None);
        assert!(result[2].is_some_and(f64::is_finite));
    }

    #[test]
    fn rolling_std_is_sample_std() {
        // Window [10, 11, 12]: mean 11, squared deviations sum 2, / (3 - 1) = 1.
        let result = rolling_std(&CLOSES, 3);
        assert_eq!(result[1], None);
        assert_approx(result[2].unwrap(), 1.0, DEFAULT_EPSILON);
        // Window [11, 10, 9] also has std 1.
        assert_approx(result[5].unwrap(), 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rolling_std_window_1_is_undefined() {
        assert!(rolling_std(&CLOSES, 1).iter().all(Option::is_none));
    }

    #[test]
    fn rolling_std_constant_values_is_zero() {
        let result = rolling_std(&[5.0, 5.0, 5.0, 5.0], 3);
        assert_approx(result[3].unwrap(), 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_mean_known_values() {
        // span 3 -> alpha 0.5
        let result = ewm_mean(&[10.0, 11.0, 12.0, 13.0], 3);
        assert_approx(result[0].unwrap(), 10.0, DEFAULT_EPSILON);
        assert_approx(result[1].unwrap(), 10.5, DEFAULT_EPSILON);
        assert_approx(result[2].unwrap(), 11.25, DEFAULT_EPSILON);
        assert_approx(result[3].unwrap(), 12.125, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_mean_single_value() {
        assert_eq!(ewm_mean(&[42.0], 20), vec![Some(42.0)]);
    }

    #[test]
    fn ewm_mean_span_1_tracks_input() {
        let result = ewm_mean(&[1.0, 5.0, 2.0], 1);
        assert_eq!(result, vec![Some(1.0), Some(5.0), Some(2.0)]);
    }

    #[test]
    fn ewm_mean_skips_undefined_inputs() {
        let values = [None, Some(10.0), None, Some(14.0)];
        let result = ewm_mean(&values, 3);
        assert_eq!(result[0], None);
        assert_approx(result[1].unwrap(), 10.0, DEFAULT_EPSILON);
        assert_eq!(result[2], None);
        assert_approx(result[3].unwrap(), 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ewm_mean_empty_input() {
        assert!(ewm_mean::<f64>(&[], 5).is_empty());
    }
}
