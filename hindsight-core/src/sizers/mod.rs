//! Position Sizers — determine order quantity.
//!
//! Sizers translate cash, equity and volatility into a share quantity for an
//! entry. They never decide whether to enter; a result of 0 means "no entry".

pub mod fixed_fraction;
pub mod vol_target;

pub use fixed_fraction::FixedFraction;
pub use vol_target::VolatilityTargeted;

/// Inputs available to a sizer on the signal bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingContext {
    /// Free cash before the order.
    pub cash: f64,
    /// Mark-to-market equity on the signal bar.
    pub equity: f64,
    /// Price the order is expected to fill at.
    pub fill_price: f64,
    /// ATR on the signal bar, if computed.
    pub atr: Option<f64>,
}

impl SizingContext {
    pub(crate) fn has_usable_price(&self) -> bool {
        self.fill_price.is_finite() && self.fill_price > 0.0
    }
}

pub trait Sizer: Send + Sync {
    /// Quantity to trade; never negative, 0 when no entry should be made.
    fn size(&self, ctx: &SizingContext) -> f64;

    /// Sizer name for logging
    fn name(&self) -> &str;
}
