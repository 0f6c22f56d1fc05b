//! Fixed-fraction sizer: invest a fixed share of free cash in whole units.

use super::{Sizer, SizingContext};
use serde::{Deserialize, Serialize};

/// shares = floor(cash × fraction / fill_price), never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedFraction {
    pub fraction: f64,
}

impl FixedFraction {
    pub const DEFAULT_FRACTION: f64 = 0.95;

    pub fn new(fraction: f64) -> Self {
        Self { fraction }
    }
}

impl Default for FixedFraction {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FRACTION)
    }
}

impl Sizer for FixedFraction {
    fn size(&self, ctx: &SizingContext) -> f64 {
        if !ctx.has_usable_price() {
            return 0.0;
        }
        let investable = ctx.cash * self.fraction;
        let shares = (investable / ctx.fill_price).floor();
        if shares.is_finite() {
            shares.max(0.0)
        } else {
            0.0
        }
    }

    fn name(&self) -> &str {
        "fixed_fraction"
    }
}
