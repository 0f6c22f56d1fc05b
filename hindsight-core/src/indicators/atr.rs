//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|), with the
//! first bar's previous close taken as its own close.
//! ATR is the left-padded rolling mean of TR, so it is defined from bar 0.

use super::sma::rolling_mean;
use crate::components::indicator::Indicator;
use crate::domain::Bar;
use crate::error::IndicatorError;

/// True Range series. Any non-finite input in a row yields NaN for that row.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Result<Vec<f64>, IndicatorError> {
    check_lengths(high, low, close)?;

    let tr = (0..high.len())
        .map(|i| {
            let (h, l) = (high[i], low[i]);
            let pc = if i == 0 { close[0] } else { close[i - 1] };
            if !(h.is_finite() && l.is_finite() && pc.is_finite()) {
                return f64::NAN;
            }
            (h - l).max((h - pc).abs()).max((l - pc).abs())
        })
        .collect();
    Ok(tr)
}

/// ATR over the whole series.
pub fn atr(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
) -> Result<Vec<f64>, IndicatorError> {
    let tr = true_range(high, low, close)?;
    rolling_mean(&tr, period)
}

fn check_lengths(high: &[f64], low: &[f64], close: &[f64]) -> Result<(), IndicatorError> {
    if high.len() != low.len() || high.len() != close.len() {
        return Err(IndicatorError::InvalidArgument(format!(
            "series length mismatch: high={}, low={}, close={}",
            high.len(),
            low.len(),
            close.len()
        )));
    }
    Ok(())
}

/// ATR as a bar-level indicator.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidArgument("ATR period must be >= 1".into()));
        }
        Ok(Self {
            period,
            name: format!("atr_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        atr(&high, &low, &close, self.period).unwrap_or_else(|_| vec![f64::NAN; bars.len()])
    }
}
