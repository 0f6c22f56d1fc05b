//! Engine configuration, mutable state, and run result types.

use crate::domain::{EquityPoint, ExposureState, PendingOrder, Position, Trade};
use crate::error::BacktestError;
use crate::sizers::{FixedFraction, Sizer, VolatilityTargeted};
use serde::{Deserialize, Serialize};

use super::accounting::Ledger;
use super::summary::Summary;

/// How entries are sized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionPolicy {
    FixedFraction(FixedFraction),
    VolatilityTargeted(VolatilityTargeted),
}

impl ExecutionPolicy {
    pub fn sizer(&self) -> &dyn Sizer {
        match self {
            ExecutionPolicy::FixedFraction(s) => s,
            ExecutionPolicy::VolatilityTargeted(s) => s,
        }
    }

    pub fn needs_atr(&self) -> bool {
        matches!(self, ExecutionPolicy::VolatilityTargeted(_))
    }

    fn validate(&self) -> Result<(), BacktestError> {
        match self {
            ExecutionPolicy::FixedFraction(s) => {
                if !(s.fraction.is_finite() && s.fraction > 0.0 && s.fraction <= 1.0) {
                    return Err(BacktestError::InvalidInput(format!(
                        "fraction must be in (0, 1], got {}",
                        s.fraction
                    )));
                }
            }
            ExecutionPolicy::VolatilityTargeted(s) => {
                if !(s.target_annual_vol.is_finite() && s.target_annual_vol > 0.0) {
                    return Err(BacktestError::InvalidInput(format!(
                        "target_annual_vol must be positive, got {}",
                        s.target_annual_vol
                    )));
                }
                if !(s.bars_per_year.is_finite() && s.bars_per_year > 0.0) {
                    return Err(BacktestError::InvalidInput(format!(
                        "bars_per_year must be positive, got {}",
                        s.bars_per_year
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Which sides the simulator may take.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionPolicy {
    #[default]
    LongOnly,
    LongShort,
}

impl DirectionPolicy {
    pub fn allows_short(self) -> bool {
        self == DirectionPolicy::LongShort
    }
}

/// ATR trailing stop distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingStop {
    pub atr_multiple: f64,
}

/// Configuration for a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_capital: f64,
    pub execution: ExecutionPolicy,
    #[serde(default)]
    pub direction: DirectionPolicy,
    #[serde(default)]
    pub trailing_stop: Option<TrailingStop>,
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
}

fn default_atr_period() -> usize {
    EngineConfig::DEFAULT_ATR_PERIOD
}

impl EngineConfig {
    pub const DEFAULT_CAPITAL: f64 = 100_000.0;
    pub const DEFAULT_ATR_PERIOD: usize = 14;

    /// Daily long-only variant: 95% of cash in whole shares.
    pub fn daily() -> Self {
        Self {
            initial_capital: Self::DEFAULT_CAPITAL,
            execution: ExecutionPolicy::FixedFraction(FixedFraction::default()),
            direction: DirectionPolicy::LongOnly,
            trailing_stop: None,
            atr_period: Self::DEFAULT_ATR_PERIOD,
        }
    }

    /// Weekly long/short variant sized to 20% annualised volatility.
    pub fn weekly() -> Self {
        Self {
            initial_capital: Self::DEFAULT_CAPITAL,
            execution: ExecutionPolicy::VolatilityTargeted(VolatilityTargeted::weekly()),
            direction: DirectionPolicy::LongShort,
            trailing_stop: None,
            atr_period: Self::DEFAULT_ATR_PERIOD,
        }
    }

    pub fn with_capital(mut self, initial_capital: f64) -> Self {
        self.initial_capital = initial_capital;
        self
    }

    pub fn with_direction(mut self, direction: DirectionPolicy) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_trailing_stop(mut self, atr_multiple: f64) -> Self {
        self.trailing_stop = Some(TrailingStop { atr_multiple });
        self
    }

    /// Whether the run needs an ATR series.
    pub fn needs_atr(&self) -> bool {
        self.execution.needs_atr() || self.trailing_stop.is_some()
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(BacktestError::InvalidInput(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if self.atr_period == 0 {
            return Err(BacktestError::InvalidInput("atr_period must be >= 1".into()));
        }
        if let Some(stop) = self.trailing_stop {
            if !(stop.atr_multiple.is_finite() && stop.atr_multiple > 0.0) {
                return Err(BacktestError::InvalidInput(format!(
                    "trailing stop atr_multiple must be positive, got {}",
                    stop.atr_multiple
                )));
            }
        }
        self.execution.validate()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::daily()
    }
}

/// Counters describing what happened during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub bars_processed: usize,
    /// Bars skipped for signal evaluation because a price was missing or invalid.
    pub invalid_bars: usize,
    pub entries_filled: usize,
    pub exits_filled: usize,
    /// Orders discarded because their fill price was unavailable.
    pub dropped_orders: usize,
    /// Entry signals that sized to zero shares.
    pub zero_size_entries: usize,
    pub forced_liquidation: bool,
}

/// Mutable state that evolves bar-by-bar during the engine loop.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub ledger: Ledger,
    pub position: Option<Position>,
    pub pending: PendingOrder,
    /// Last valid close and the bar it came from (for invalid-bar carry-forward).
    pub last_valid_close: Option<(usize, f64)>,
    pub diagnostics: RunDiagnostics,
}

impl EngineState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            ledger: Ledger::new(initial_capital),
            position: None,
            pending: PendingOrder::None,
            last_valid_close: None,
            diagnostics: RunDiagnostics::default(),
        }
    }

    pub fn exposure(&self) -> ExposureState {
        match &self.position {
            None => ExposureState::Flat,
            Some(p) if p.is_long() => ExposureState::Long,
            Some(_) => ExposureState::Short,
        }
    }

    /// Put an order in the pending slot. The slot must be empty.
    pub fn schedule(&mut self, order: PendingOrder) -> Result<(), BacktestError> {
        if !self.pending.is_none() {
            return Err(BacktestError::Computation(format!(
                "attempted to schedule {order:?} while {:?} is pending",
                self.pending
            )));
        }
        self.pending = order;
        Ok(())
    }

    /// Price to mark the open position at on a bar whose close is unusable.
    pub fn carry_forward_price(&self, position: &Position) -> f64 {
        match self.last_valid_close {
            Some((index, close)) if index >= position.entry_index => close,
            _ => position.entry_price,
        }
    }
}

/// Result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// One point per input bar.
    pub equity_curve: Vec<EquityPoint>,
    /// Completed trades in exit order.
    pub trades: Vec<Trade>,
    pub summary: Summary,
    pub diagnostics: RunDiagnostics,
}

impl RunResult {
    pub fn final_equity(&self) -> f64 {
        self.summary.final_equity
    }
}
