//! Backtesting engine — bar-by-bar execution simulator and supporting types.
//!
//! The engine consumes prepared bars (sorted, `next_open` attached) and a
//! precomputed signal frame, then runs a sequential fold over the bars:
//! fill at open, evaluate signals, schedule at most one order for the next
//! open, mark to market at close.

pub mod accounting;
pub mod loop_runner;
pub mod state;
pub mod summary;

pub use accounting::Ledger;
pub use loop_runner::{run_backtest, run_strategy};
pub use state::{
    DirectionPolicy, EngineConfig, EngineState, ExecutionPolicy, RunDiagnostics, RunResult,
    TrailingStop,
};
pub use summary::Summary;
