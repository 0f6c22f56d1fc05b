//! Indicator trait and precomputed indicator values container.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! They are precomputed once before the bar loop and read by index inside it.

use crate::domain::Bar;
use std::collections::HashMap;

/// Trait for bar-level indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_5", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars whose value is a warm-up approximation.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Container for precomputed indicator values, keyed by indicator name.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute every indicator over `bars`.
    pub fn precompute(bars: &[Bar], indicators: &[&dyn Indicator]) -> Self {
        let mut iv = Self::new();
        for indicator in indicators {
            let series = indicator.compute(bars);
            debug_assert_eq!(
                series.len(),
                bars.len(),
                "indicator '{}' produced {} values for {} bars",
                indicator.name(),
                series.len(),
                bars.len()
            );
            iv.insert(indicator.name(), series);
        }
        iv
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Value at a bar index; `None` for an unknown name or out-of-range index.
    pub fn get(&self, name: &str, bar_index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(bar_index).copied())
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{make_bars, Atr, Sma};

    #[test]
    fn indicator_values_insert_and_get() {
        let mut iv = IndicatorValues::new();
        iv.insert("atr_14", vec![f64::NAN, 1.5, 1.6]);
        assert!(iv.get("atr_14", 0).unwrap().is_nan());
        assert_eq!(iv.get("atr_14", 2), Some(1.6));
        assert_eq!(iv.get("atr_14", 3), None);
        assert_eq!(iv.get("nonexistent", 0), None);
    }

    #[test]
    fn precompute_keys_by_name() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let sma = Sma::new(3).unwrap();
        let atr = Atr::new(2).unwrap();
        let iv = IndicatorValues::precompute(&bars, &[&sma, &atr]);

        assert_eq!(iv.len(), 2);
        assert_eq!(iv.get_series("sma_3").map(|s| s.len()), Some(5));
        // mean(10, 11, 12)
        assert!((iv.get("sma_3", 2).unwrap() - 11.0).abs() < 1e-10);
        assert!(iv.get("atr_2", 0).unwrap().is_finite());
    }
}
