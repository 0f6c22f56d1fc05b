//! Hindsight Runner — configuration, data loading, and run orchestration.
//!
//! This crate builds on `hindsight-core` to provide:
//! - TOML backtest configuration with daily and weekly presets
//! - Symbol catalog (display names and synthetic-data parameters)
//! - Bar loading from a provider, CSV files, or a seeded synthetic walk
//! - Single and parallel batch runners
//! - Output report and artifact export

pub mod catalog;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod report;
pub mod runner;

pub use catalog::{normalize_symbol, SymbolCatalog, SymbolInfo};
pub use config::{BacktestConfig, ConfigError};
pub use data_loader::{load_bars, LoadError, LoadOptions, LoadedData, SourceKind};
pub use export::{load_report, save_artifacts};
pub use report::BacktestReport;
pub use runner::{
    run_backtest_from_data, run_batch, run_single_backtest, BacktestResult, BatchOutcome, RunError,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<SymbolCatalog>();
        assert_sync::<SymbolCatalog>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<BacktestReport>();
        assert_sync::<BacktestReport>();
        assert_send::<RunError>();
    }
}
