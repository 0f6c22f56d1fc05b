//! Strategy-side components consumed by the engine.
//!
//! - Indicator: precomputed numeric series
//! - Signal generator: per-bar entry/exit flags
//! - Directional filter: per-bar long/short permission

pub mod filter;
pub mod indicator;
pub mod signal;

pub use filter::RegimeFilter;
pub use indicator::{Indicator, IndicatorValues};
pub use signal::{BarSignal, NullSignal, SignalFrame, SignalGenerator, SmaCrossover};
