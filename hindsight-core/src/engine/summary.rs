//! Aggregate statistics over a finished run. Values are unrounded here.

use crate::domain::Trade;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub initial_equity: f64,
    pub final_equity: f64,
    pub total_return_pct: f64,
    pub trade_count: usize,
    pub win_rate_pct: f64,
}

impl Summary {
    pub fn compute(initial_equity: f64, final_equity: f64, trades: &[Trade]) -> Self {
        let total_return_pct = if initial_equity == 0.0 {
            0.0
        } else {
            (final_equity - initial_equity) / initial_equity * 100.0
        };

        let trade_count = trades.len();
        let wins = trades.iter().filter(|t| t.is_winner()).count();
        let win_rate_pct = if trade_count == 0 {
            0.0
        } else {
            100.0 * wins as f64 / trade_count as f64
        };

        Self {
            initial_equity,
            final_equity,
            total_return_pct,
            trade_count,
            win_rate_pct,
        }
    }
}
