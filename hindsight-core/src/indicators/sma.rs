//! Simple Moving Average (SMA).
//!
//! Mean over a trailing window that is left-padded at the start of the
//! series: the window at index i covers `max(0, i - period + 1) ..= i`, so
//! the first value equals the first input.

use crate::components::indicator::Indicator;
use crate::domain::Bar;
use crate::error::IndicatorError;

/// SMA of `series` ending at `index`.
///
/// Only values at or before `index` are read. Non-finite values inside the
/// window are skipped; a window with no finite values yields NaN.
pub fn sma_at(series: &[f64], index: isize, period: usize) -> Result<f64, IndicatorError> {
    if index < 0 {
        return Err(IndicatorError::InvalidArgument(format!(
            "negative index {index}"
        )));
    }
    if period == 0 {
        return Err(IndicatorError::InvalidArgument("period must be >= 1".into()));
    }
    let index = index as usize;
    if index >= series.len() {
        return Err(IndicatorError::InvalidArgument(format!(
            "index {index} out of range for series of length {}",
            series.len()
        )));
    }

    let start = (index + 1).saturating_sub(period);
    Ok(finite_mean(&series[start..=index]))
}

/// Left-padded rolling mean over the whole series.
///
/// Each value is the mean of its own window, so `rolling_mean(s, p)[i]`
/// equals `sma_at(s, i, p)` exactly. A running sum would drift over long
/// series and flip exact comparisons downstream.
pub fn rolling_mean(series: &[f64], period: usize) -> Result<Vec<f64>, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidArgument("period must be >= 1".into()));
    }

    Ok((0..series.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(period);
            finite_mean(&series[start..=i])
        })
        .collect())
}

fn finite_mean(window: &[f64]) -> f64 {
    let (sum, count) = window
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// SMA over adjusted close, as a bar-level indicator.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidArgument("SMA period must be >= 1".into()));
        }
        Ok(Self {
            period,
            name: format!("sma_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    // Left padding produces a value from the first bar.
    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let adj: Vec<f64> = bars.iter().map(|b| b.adj_close).collect();
        rolling_mean(&adj, self.period).unwrap_or_else(|_| vec![f64::NAN; bars.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_at_full_window() {
        let series = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        // mean(11, 12, 13, 14, 15)
        assert_approx(sma_at(&series, 5, 5).unwrap(), 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_at_left_padded_window() {
        let series = [10.0, 20.0, 30.0];
        assert_approx(sma_at(&series, 0, 5).unwrap(), 10.0, DEFAULT_EPSILON);
        assert_approx(sma_at(&series, 1, 5).unwrap(), 15.0, DEFAULT_EPSILON);
        assert_approx(sma_at(&series, 2, 5).unwrap(), 20.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_at_period_one_is_identity() {
        let series = [3.0, 7.0, 5.0];
        for i in 0..3 {
            assert_approx(sma_at(&series, i as isize, 1).unwrap(), series[i], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn sma_at_rejects_bad_arguments() {
        let series = [1.0, 2.0];
        assert!(matches!(sma_at(&series, -1, 2), Err(IndicatorError::InvalidArgument(_))));
        assert!(sma_at(&series, 2, 2).is_err());
        assert!(sma_at(&series, 0, 0).is_err());
    }

    #[test]
    fn sma_at_reads_nothing_past_index() {
        let full = [1.0, 2.0, 3.0, 100.0, 200.0];
        let truncated = &full[..3];
        assert_eq!(sma_at(&full, 2, 3).unwrap(), sma_at(truncated, 2, 3).unwrap());
    }

    #[test]
    fn rolling_mean_matches_sma_at() {
        let series = [5.0, 6.0, 9.0, 4.0, 8.0, 7.0, 3.0];
        let rolled = rolling_mean(&series, 3).unwrap();
        for i in 0..series.len() {
            assert_approx(rolled[i], sma_at(&series, i as isize, 3).unwrap(), DEFAULT_EPSILON);
        }
    }

    #[test]
    fn rolling_mean_is_exact_on_long_random_walk() {
        // Two-decimal prices, as quoted by the provider.
        let mut state: u64 = 42;
        let mut price = 1234.56_f64;
        let series: Vec<f64> = (0..3000)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let step = ((state >> 33) % 201) as f64 / 100.0 - 1.0;
                price = ((price + step).max(1.0) * 100.0).round() / 100.0;
                price
            })
            .collect();

        for period in [5, 15, 40] {
            let rolled = rolling_mean(&series, period).unwrap();
            for i in 0..series.len() {
                assert_eq!(
                    rolled[i].to_bits(),
                    sma_at(&series, i as isize, period).unwrap().to_bits(),
                    "period {period}, index {i}"
                );
            }
        }
    }

    #[test]
    fn rolling_mean_of_constant_series_is_constant() {
        let series = vec![1234.56; 400];
        let rolled = rolling_mean(&series, 15).unwrap();
        assert!(rolled.iter().all(|&v| v == rolled[0]));
    }

    #[test]
    fn rolling_mean_skips_non_finite() {
        let series = [10.0, f64::NAN, 20.0, 30.0];
        let rolled = rolling_mean(&series, 2).unwrap();
        assert_approx(rolled[0], 10.0, DEFAULT_EPSILON);
        assert_approx(rolled[1], 10.0, DEFAULT_EPSILON);
        assert_approx(rolled[2], 20.0, DEFAULT_EPSILON);
        assert_approx(rolled[3], 25.0, DEFAULT_EPSILON);

        let all_nan = rolling_mean(&[f64::NAN, f64::NAN], 2).unwrap();
        assert!(all_nan.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sma_indicator_uses_adj_close() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0]);
        bars[2].adj_close = 30.0;
        let sma = Sma::new(2).unwrap();
        let result = sma.compute(&bars);
        assert_eq!(sma.name(), "sma_2");
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[2], 20.5, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_rejects_zero_period() {
        assert!(Sma::new(0).is_err());
    }
}
