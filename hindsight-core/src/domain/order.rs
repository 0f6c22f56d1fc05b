//! Scheduled orders and the single pending-order slot.

use super::position::PositionSide;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A fill scheduled for the open of a future bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub side: PositionSide,
    /// Bar whose inputs produced the order.
    pub signal_index: usize,
    /// Bar at whose open the order fills.
    pub fill_index: usize,
    pub scheduled_date: NaiveDate,
    pub shares: f64,
}

/// Why an exit was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// The strategy's exit signal fired.
    Signal,
    /// The directional filter stopped permitting the position's side.
    RegimeFilter,
    /// The bar range pierced the trailing stop.
    TrailingStop,
    /// Force-liquidated after the final bar.
    EndOfData,
}

/// The simulator's pending-order slot. At most one order is outstanding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PendingOrder {
    #[default]
    None,
    Entry(Order),
    Exit { order: Order, reason: ExitReason },
}

impl PendingOrder {
    pub fn is_none(&self) -> bool {
        matches!(self, PendingOrder::None)
    }

    /// The order if it is due to fill on `bar_index`.
    pub fn due_at(&self, bar_index: usize) -> Option<&Order> {
        match self {
            PendingOrder::None => None,
            PendingOrder::Entry(order) | PendingOrder::Exit { order, .. } => {
                (order.fill_index == bar_index).then_some(order)
            }
        }
    }

    /// Empty the slot, returning what was in it.
    pub fn take(&mut self) -> PendingOrder {
        std::mem::take(self)
    }
}
