//! Position side, exposure state, and the open position with its trailing stop.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Direction of an open position or a scheduled order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }
}

/// Coarse simulator state: flat or exposed in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExposureState {
    Flat,
    Long,
    Short,
}

/// The single open position of a run.
///
/// Created on an entry fill and dropped on the matching exit fill; the
/// simulator owns it and nothing else mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub shares: f64,
    /// Trailing stop level in force for the next bar, if stops are enabled.
    pub stop_level: Option<f64>,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    /// PnL if the position were closed at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.side.sign() * (price - self.entry_price) * self.shares
    }

    /// Value the position contributes on top of free cash when marked at `price`.
    ///
    /// Long: the shares at market. Short: the entry notional minus the cost of
    /// buying back at market, which is the unrealized PnL because the sale
    /// proceeds are held as collateral outside free cash.
    pub fn mark_value(&self, price: f64) -> f64 {
        match self.side {
            PositionSide::Long => self.shares * price,
            PositionSide::Short => self.shares * self.entry_price - self.shares * price,
        }
    }

    /// Ratchet the trailing stop toward price. Stops never loosen.
    pub fn ratchet_stop(&mut self, candidate: f64) {
        if !candidate.is_finite() {
            return;
        }
        self.stop_level = Some(match (self.side, self.stop_level) {
            (PositionSide::Long, Some(current)) => current.max(candidate),
            (PositionSide::Short, Some(current)) => current.min(candidate),
            (_, None) => candidate,
        });
    }

    /// True when the bar's range pierces the stop level in force.
    pub fn stop_pierced(&self, high: f64, low: f64) -> bool {
        match (self.side, self.stop_level) {
            (PositionSide::Long, Some(level)) => low < level,
            (PositionSide::Short, Some(level)) => high > level,
            (_, None) => false,
        }
    }
}
