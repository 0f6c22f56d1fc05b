//! Indicator library: stateless derived series.
//!
//! Both indicators implement the `Indicator` trait from `components::indicator`
//! and are precomputed once before the bar loop. The free functions (`sma_at`,
//! `rolling_mean`, `true_range`, `atr`) work on raw series.

pub mod atr;
pub mod sma;

pub use atr::{atr, true_range, Atr};
pub use sma::{rolling_mean, sma_at, Sma};

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0, adj_close = close, volume = 1000, and
/// next_open attached.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                adj_close: close,
                volume: 1000,
                next_open: (i + 1 < closes.len()).then_some(close),
            }
        })
        .collect()
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

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
