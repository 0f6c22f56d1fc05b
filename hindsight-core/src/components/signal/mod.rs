//! Signal generation contract.
//!
//! A generator turns bar history into four boolean series index-aligned with
//! the bars. Generators never see position or cash state, and the value at
//! bar i may depend only on bars `0..=i`.

pub mod sma_crossover;

pub use sma_crossover::SmaCrossover;

use crate::domain::Bar;
use crate::error::BacktestError;
use serde::{Deserialize, Serialize};

/// The four signal flags for one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarSignal {
    pub long_entry: bool,
    pub short_entry: bool,
    pub long_exit: bool,
    pub short_exit: bool,
}

/// Per-bar entry/exit flags for a whole series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalFrame {
    pub long_entry: Vec<bool>,
    pub short_entry: Vec<bool>,
    pub long_exit: Vec<bool>,
    pub short_exit: Vec<bool>,
}

impl SignalFrame {
    /// Build a frame, rejecting sequences of unequal length.
    pub fn new(
        long_entry: Vec<bool>,
        short_entry: Vec<bool>,
        long_exit: Vec<bool>,
        short_exit: Vec<bool>,
    ) -> Result<Self, BacktestError> {
        let n = long_entry.len();
        if short_entry.len() != n || long_exit.len() != n || short_exit.len() != n {
            return Err(BacktestError::InvalidInput(format!(
                "signal sequences differ in length: long_entry={}, short_entry={}, long_exit={}, short_exit={}",
                n,
                short_entry.len(),
                long_exit.len(),
                short_exit.len()
            )));
        }
        Ok(Self {
            long_entry,
            short_entry,
            long_exit,
            short_exit,
        })
    }

    /// Build a frame from sequences with missing values; missing is false.
    pub fn from_optional(
        long_entry: &[Option<bool>],
        short_entry: &[Option<bool>],
        long_exit: &[Option<bool>],
        short_exit: &[Option<bool>],
    ) -> Result<Self, BacktestError> {
        let coerce = |s: &[Option<bool>]| s.iter().map(|v| v.unwrap_or(false)).collect();
        Self::new(
            coerce(long_entry),
            coerce(short_entry),
            coerce(long_exit),
            coerce(short_exit),
        )
    }

    /// A frame with every flag false.
    pub fn flat(len: usize) -> Self {
        Self {
            long_entry: vec![false; len],
            short_entry: vec![false; len],
            long_exit: vec![false; len],
            short_exit: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.long_entry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.long_entry.is_empty()
    }

    /// Flags at bar `i`. Out-of-range indices read as all false.
    pub fn at(&self, i: usize) -> BarSignal {
        let flag = |s: &[bool]| s.get(i).copied().unwrap_or(false);
        BarSignal {
            long_entry: flag(&self.long_entry),
            short_entry: flag(&self.short_entry),
            long_exit: flag(&self.long_exit),
            short_exit: flag(&self.short_exit),
        }
    }

    /// Check alignment against a bar series.
    pub fn validate(&self, bar_count: usize) -> Result<(), BacktestError> {
        let lengths = [
            self.long_entry.len(),
            self.short_entry.len(),
            self.long_exit.len(),
            self.short_exit.len(),
        ];
        if lengths.iter().any(|&l| l != bar_count) {
            return Err(BacktestError::InvalidInput(format!(
                "signal lengths {lengths:?} do not match {bar_count} bars"
            )));
        }
        Ok(())
    }
}

/// Trait for signal generators.
pub trait SignalGenerator: Send + Sync {
    /// Human-readable name (e.g., "sma_crossover").
    fn name(&self) -> &str;

    /// Produce flags for every bar. The result has `bars.len()` entries.
    fn generate(&self, bars: &[Bar]) -> SignalFrame;
}

/// A generator that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSignal;

impl SignalGenerator for NullSignal {
    fn name(&self) -> &str {
        "null"
    }

    fn generate(&self, bars: &[Bar]) -> SignalFrame {
        SignalFrame::flat(bars.len())
    }
}
