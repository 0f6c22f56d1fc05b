//! SMA crossover signal over adjusted close.
//!
//! Long entry when the fast SMA crosses above the slow SMA, long exit when it
//! crosses below. With shorting enabled the same crossings also drive short
//! exit and short entry. A crossover compares the current relationship with
//! the previous bar's, so a sustained condition fires once. Bar 0 uses itself
//! as the previous bar and therefore never fires.

use super::{SignalFrame, SignalGenerator};
use crate::domain::Bar;
use crate::error::BacktestError;
use crate::indicators::rolling_mean;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmaCrossover {
    pub fast: usize,
    pub slow: usize,
    pub allow_short: bool,
}

impl SmaCrossover {
    pub const DEFAULT_FAST: usize = 5;
    pub const DEFAULT_SLOW: usize = 15;

    pub fn new(fast: usize, slow: usize, allow_short: bool) -> Result<Self, BacktestError> {
        if fast == 0 {
            return Err(BacktestError::InvalidInput("fast period must be >= 1".into()));
        }
        if slow <= fast {
            return Err(BacktestError::InvalidInput(format!(
                "slow period ({slow}) must be greater than fast period ({fast})"
            )));
        }
        Ok(Self {
            fast,
            slow,
            allow_short,
        })
    }
}

impl Default for SmaCrossover {
    fn default() -> Self {
        Self {
            fast: Self::DEFAULT_FAST,
            slow: Self::DEFAULT_SLOW,
            allow_short: false,
        }
    }
}

impl SignalGenerator for SmaCrossover {
    fn name(&self) -> &str {
        "sma_crossover"
    }

    fn generate(&self, bars: &[Bar]) -> SignalFrame {
        let n = bars.len();
        let adj: Vec<f64> = bars.iter().map(|b| b.adj_close).collect();
        let (Ok(fast), Ok(slow)) = (rolling_mean(&adj, self.fast), rolling_mean(&adj, self.slow))
        else {
            return SignalFrame::flat(n);
        };

        let mut frame = SignalFrame::flat(n);
        for i in 0..n {
            let prev = i.saturating_sub(1);
            let (f, s) = (fast[i], slow[i]);
            let (pf, ps) = (fast[prev], slow[prev]);

            let tol = cross_tolerance(f, s).max(cross_tolerance(pf, ps));
            let cross_up = f - s > tol && pf - ps <= tol;
            let cross_down = s - f > tol && ps - pf <= tol;

            frame.long_entry[i] = cross_up;
            frame.long_exit[i] = cross_down;
            if self.allow_short {
                frame.short_entry[i] = cross_down;
                frame.short_exit[i] = cross_up;
            }
        }
        frame
    }
}

/// Averages closer than this are treated as equal.
fn cross_tolerance(a: f64, b: f64) -> f64 {
    1e-9 * a.abs().max(b.abs()).max(1.0)
}
