//! Cash ledger for the single-position simulator.
//!
//! Free cash never includes capital committed to the open position. A long
//! entry pays for the shares out of cash; a short entry leaves free cash
//! untouched because the sale proceeds are held against the buy-back. Equity
//! is always `cash + position.mark_value(price)`.

use crate::domain::{Position, PositionSide, Trade};
use crate::error::BacktestError;
use serde::{Deserialize, Serialize};

/// Relative tolerance for the end-of-run accounting identity.
pub const CLOSURE_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    initial_capital: f64,
    cash: f64,
    realized_pnl: f64,
}

impl Ledger {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            realized_pnl: 0.0,
        }
    }

    /// Book an entry fill.
    pub fn open(&mut self, side: PositionSide, price: f64, shares: f64) {
        if side == PositionSide::Long {
            self.cash -= price * shares;
        }
    }

    /// Book an exit fill and return the realized PnL.
    pub fn close(&mut self, position: &Position, price: f64) -> f64 {
        let pnl = Trade::realized_pnl(position.side, position.entry_price, price, position.shares);
        match position.side {
            PositionSide::Long => self.cash += position.shares * price,
            PositionSide::Short => self.cash += pnl,
        }
        self.realized_pnl += pnl;
        pnl
    }

    /// Mark-to-market equity with the open position (if any) valued at `price`.
    pub fn mark(&self, position: Option<&Position>, price: f64) -> f64 {
        self.cash + position.map_or(0.0, |p| p.mark_value(price))
    }

    pub fn unrealized_pnl(&self, position: Option<&Position>, price: f64) -> f64 {
        position.map_or(0.0, |p| p.unrealized_pnl(price))
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Verify realized + unrealized PnL equals the change in equity.
    pub fn check_closure(&self, final_equity: f64, unrealized: f64) -> Result<(), BacktestError> {
        let lhs = self.realized_pnl + unrealized;
        let rhs = final_equity - self.initial_capital;
        let scale = self.initial_capital.abs().max(1.0);
        if (lhs - rhs).abs() > CLOSURE_TOLERANCE * scale {
            return Err(BacktestError::Computation(format!(
                "accounting identity violated: realized {} + unrealized {unrealized} != final {final_equity} - initial {}",
                self.realized_pnl, self.initial_capital
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn position(side: PositionSide, entry_price: f64, shares: f64) -> Position {
        Position {
            side,
            entry_index: 1,
            entry_date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            entry_price,
            shares,
            stop_level: None,
        }
    }

    #[test]
    fn long_round_trip() {
        let mut ledger = Ledger::new(10_000.0);
        let pos = position(PositionSide::Long, 100.0, 50.0);
        ledger.open(pos.side, 100.0, 50.0);
        assert_eq!(ledger.cash(), 5_000.0);
        assert_eq!(ledger.mark(Some(&pos), 110.0), 10_500.0);

        let pnl = ledger.close(&pos, 120.0);
        assert_eq!(pnl, 1_000.0);
        assert_eq!(ledger.cash(), 11_000.0);
        assert_eq!(ledger.mark(None, 999.0), 11_000.0);
        assert!(ledger.check_closure(11_000.0, 0.0).is_ok());
    }

    #[test]
    fn short_entry_leaves_cash_untouched() {
        let mut ledger = Ledger::new(10_000.0);
        let pos = position(PositionSide::Short, 100.0, 50.0);
        ledger.open(pos.side, 100.0, 50.0);
        assert_eq!(ledger.cash(), 10_000.0);
        // Price fell: short is up 500.
        assert_eq!(ledger.mark(Some(&pos), 90.0), 10_500.0);

        let pnl = ledger.close(&pos, 110.0);
        assert_eq!(pnl, -500.0);
        assert_eq!(ledger.cash(), 9_500.0);
    }

    #[test]
    fn equity_equals_initial_plus_pnl_while_open() {
        let mut ledger = Ledger::new(10_000.0);
        let pos = position(PositionSide::Long, 100.0, 30.0);
        ledger.open(pos.side, 100.0, 30.0);
        let equity = ledger.mark(Some(&pos), 95.0);
        let unrealized = ledger.unrealized_pnl(Some(&pos), 95.0);
        assert!(ledger.check_closure(equity, unrealized).is_ok());
    }

    #[test]
    fn closure_violation_is_computation_error() {
        let ledger = Ledger::new(10_000.0);
        let err = ledger.check_closure(10_001.0, 0.0).unwrap_err();
        assert!(matches!(err, BacktestError::Computation(_)));
    }
}
