//! Trade — a completed round trip, and the equity curve point.

use super::order::ExitReason;
use super::position::PositionSide;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A completed round-trip trade: entry fill → exit fill.
///
/// Created atomically when the exit fills and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: PositionSide,

    // ── Entry ──
    pub entry_index: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    /// Bar index of the exit fill; `bars.len()` for an end-of-data liquidation.
    pub exit_index: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    pub shares: f64,
    pub pnl: f64,
    /// Return on cost basis as a fraction (0.05 = 5%).
    pub return_pct: f64,
    pub exit_reason: ExitReason,
}

impl Trade {
    /// PnL of closing `shares` opened at `entry_price` on `side` at `exit_price`.
    pub fn realized_pnl(side: PositionSide, entry_price: f64, exit_price: f64, shares: f64) -> f64 {
        match side {
            PositionSide::Long => (exit_price - entry_price) * shares,
            PositionSide::Short => (entry_price - exit_price) * shares,
        }
    }

    /// PnL over cost basis, or 0 when the cost basis is zero.
    pub fn return_on_cost(pnl: f64, entry_price: f64, shares: f64) -> f64 {
        let cost_basis = entry_price * shares;
        if cost_basis == 0.0 {
            return 0.0;
        }
        pnl / cost_basis
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}

/// Mark-to-market equity at the end of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}
