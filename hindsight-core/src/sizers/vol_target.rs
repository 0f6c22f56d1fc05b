//! Volatility-targeted sizer.
//!
//! ```text
//! shares_target = equity × target_annual_vol / (ATR × √bars_per_year)
//! shares        = min(shares_target, equity / fill_price)
//! ```
//!
//! The result may be fractional. A missing, zero or non-finite ATR means no entry.

use super::{Sizer, SizingContext};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityTargeted {
    pub target_annual_vol: f64,
    pub bars_per_year: f64,
}

impl VolatilityTargeted {
    pub const DEFAULT_TARGET_VOL: f64 = 0.20;
    pub const DAILY_BARS_PER_YEAR: f64 = 252.0;
    pub const WEEKLY_BARS_PER_YEAR: f64 = 52.0;

    pub fn new(target_annual_vol: f64, bars_per_year: f64) -> Self {
        Self {
            target_annual_vol,
            bars_per_year,
        }
    }

    pub fn weekly() -> Self {
        Self::new(Self::DEFAULT_TARGET_VOL, Self::WEEKLY_BARS_PER_YEAR)
    }

    pub fn daily() -> Self {
        Self::new(Self::DEFAULT_TARGET_VOL, Self::DAILY_BARS_PER_YEAR)
    }
}

impl Sizer for VolatilityTargeted {
    fn size(&self, ctx: &SizingContext) -> f64 {
        if !ctx.has_usable_price() || ctx.equity <= 0.0 {
            return 0.0;
        }
        let atr = match ctx.atr {
            Some(a) if a.is_finite() && a > 0.0 => a,
            _ => return 0.0,
        };

        let target = ctx.equity * self.target_annual_vol / (atr * self.bars_per_year.sqrt());
        let cap = ctx.equity / ctx.fill_price;
        let shares = target.min(cap);
        if shares.is_finite() {
            shares.max(0.0)
        } else {
            0.0
        }
    }

    fn name(&self) -> &str {
        "volatility_targeted"
    }
}
