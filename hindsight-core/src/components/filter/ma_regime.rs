//! MA regime — derives directional permissions from price vs. its SMA.
//!
//! Longs are permitted while adjusted close is at or above the SMA, shorts
//! while it is at or below. Bars where either value is non-finite permit
//! neither side.

use super::RegimeFilter;
use crate::domain::Bar;
use crate::error::BacktestError;
use crate::indicators::rolling_mean;

impl RegimeFilter {
    pub fn sma_regime(bars: &[Bar], period: usize) -> Result<Self, BacktestError> {
        let adj: Vec<f64> = bars.iter().map(|b| b.adj_close).collect();
        let sma = rolling_mean(&adj, period)?;

        let (allow_long, allow_short) = adj
            .iter()
            .zip(&sma)
            .map(|(&price, &ma)| {
                if !(price.is_finite() && ma.is_finite()) {
                    return (false, false);
                }
                (price >= ma, price <= ma)
            })
            .unzip();

        Self::new(allow_long, allow_short)
    }
}
