//! Error taxonomy for the core engine.
//!
//! Every error maps onto a [`Fault`] so outer layers can tell a bad request
//! from a broken provider from a bug without matching on variants.

use crate::data::DataError;
use thiserror::Error;

/// Who is responsible for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// The caller supplied unusable input.
    Caller,
    /// The market-data provider returned nothing usable.
    Provider,
    /// An engine invariant was violated.
    Internal,
}

/// Errors from indicator computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("invalid indicator argument: {0}")]
    InvalidArgument(String),
}

/// Errors surfaced by a backtest run.
#[derive(Debug, Error)]
pub enum BacktestError {
    /// Rejected before simulation starts.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream data error: {0}")]
    UpstreamData(#[from] DataError),

    /// Invariant violation inside the simulation. Never recovered from.
    #[error("computation error: {0}")]
    Computation(String),
}

impl BacktestError {
    pub fn fault(&self) -> Fault {
        match self {
            BacktestError::InvalidInput(_) => Fault::Caller,
            BacktestError::UpstreamData(_) => Fault::Provider,
            BacktestError::Computation(_) => Fault::Internal,
        }
    }
}

impl From<IndicatorError> for BacktestError {
    fn from(e: IndicatorError) -> Self {
        BacktestError::InvalidInput(e.to_string())
    }
}
