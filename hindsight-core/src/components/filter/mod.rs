//! Directional filter — per-bar permission to hold long or short exposure.
//!
//! Entries are only scheduled on the permitted side, and an open position is
//! exited when its side stops being permitted.

pub mod ma_regime;

use crate::domain::PositionSide;
use crate::error::BacktestError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeFilter {
    allow_long: Vec<bool>,
    allow_short: Vec<bool>,
}

impl RegimeFilter {
    pub fn new(allow_long: Vec<bool>, allow_short: Vec<bool>) -> Result<Self, BacktestError> {
        if allow_long.len() != allow_short.len() {
            return Err(BacktestError::InvalidInput(format!(
                "regime filter lengths differ: allow_long={}, allow_short={}",
                allow_long.len(),
                allow_short.len()
            )));
        }
        Ok(Self {
            allow_long,
            allow_short,
        })
    }

    /// A filter that permits both sides on every bar.
    pub fn permissive(len: usize) -> Self {
        Self {
            allow_long: vec![true; len],
            allow_short: vec![true; len],
        }
    }

    pub fn len(&self) -> usize {
        self.allow_long.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allow_long.is_empty()
    }

    /// Whether `side` is permitted on bar `i`. Bars past the end are permitted.
    pub fn permits(&self, side: PositionSide, i: usize) -> bool {
        let flags = match side {
            PositionSide::Long => &self.allow_long,
            PositionSide::Short => &self.allow_short,
        };
        flags.get(i).copied().unwrap_or(true)
    }

    pub fn validate(&self, bar_count: usize) -> Result<(), BacktestError> {
        if self.len() != bar_count {
            return Err(BacktestError::InvalidInput(format!(
                "regime filter covers {} bars, expected {bar_count}",
                self.len()
            )));
        }
        Ok(())
    }
}
