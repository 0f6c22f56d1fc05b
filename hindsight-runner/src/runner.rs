//! Backtest runner — wires together config, data loading, signals, and the engine.
//!
//! Three entry points:
//! - `run_single_backtest()`: loads data, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes pre-loaded bars. No I/O.
//! - `run_batch()`: independent runs in parallel on the rayon pool.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use hindsight_core::data::{DataProvider, DataSource};
use hindsight_core::domain::Bar;
use hindsight_core::engine::{run_strategy, RunResult};
use hindsight_core::fingerprint::RunFingerprint;
use hindsight_core::{BacktestError, Fault};

use crate::catalog::SymbolCatalog;
use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_bars, LoadError, LoadOptions, LoadedData, SourceKind};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("backtest error: {0}")]
    Engine(#[from] BacktestError),
}

impl RunError {
    pub fn fault(&self) -> Fault {
        match self {
            RunError::Config(e) => e.fault(),
            RunError::Data(e) => e.fault(),
            RunError::Engine(e) => e.fault(),
        }
    }
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    /// Display name from the symbol catalog.
    pub name: String,
    pub config: BacktestConfig,
    pub fingerprint: RunFingerprint,
    pub source: DataSource,
    pub run: RunResult,
    /// The prepared bars the run consumed.
    pub bars: Vec<Bar>,
}

impl BacktestResult {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Run a single backtest, loading its bars from `source`.
pub fn run_single_backtest(
    config: &BacktestConfig,
    catalog: &SymbolCatalog,
    provider: Option<&dyn DataProvider>,
    source: &SourceKind,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let symbol = &config.backtest.symbol;
    let opts = LoadOptions {
        start: config.backtest.start_date,
        end: config.backtest.end_date,
        interval: config.backtest.interval,
        source: source.clone(),
    };
    let loaded = load_bars(symbol, &catalog.info(symbol), provider, &opts)?;
    run_backtest_from_data(config, catalog, loaded)
}

/// Run a backtest over pre-loaded bars. No I/O.
pub fn run_backtest_from_data(
    config: &BacktestConfig,
    catalog: &SymbolCatalog,
    loaded: LoadedData,
) -> Result<BacktestResult, RunError> {
    let engine_config = config.engine_config();
    let generator = config.signal_generator()?;
    let filter = config.regime_filter(&loaded.bars)?;

    let run = run_strategy(&loaded.bars, &generator, filter.as_ref(), &engine_config)?;
    let fingerprint = RunFingerprint::compute(config, &loaded.bars)?;

    info!(
        symbol = %loaded.symbol,
        run_id = fingerprint.short_id(),
        trades = run.summary.trade_count,
        total_return_pct = run.summary.total_return_pct,
        synthetic = loaded.is_synthetic(),
        "backtest finished"
    );

    Ok(BacktestResult {
        name: catalog.display_name(&loaded.symbol),
        symbol: loaded.symbol,
        config: config.clone(),
        fingerprint,
        source: loaded.source,
        run,
        bars: loaded.bars,
    })
}

/// Outcome of one run in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub symbol: String,
    pub result: Result<BacktestResult, RunError>,
}

/// Run independent backtests in parallel. One failure does not stop the others.
///
/// Outcomes come back in the order of `configs`.
pub fn run_batch(
    configs: &[BacktestConfig],
    catalog: &SymbolCatalog,
    provider: Option<&dyn DataProvider>,
    source: &SourceKind,
) -> Vec<BatchOutcome> {
    configs
        .par_iter()
        .map(|config| {
            let result = run_single_backtest(config, catalog, provider, source);
            if let Err(e) = &result {
                warn!(symbol = %config.backtest.symbol, fault = ?e.fault(), error = %e, "run failed");
            }
            BatchOutcome {
                symbol: config.backtest.symbol.clone(),
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use hindsight_core::data::{prepare_bars, RawBar};
    use hindsight_core::fingerprint::dataset_hash;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rising(symbol: &str, n: usize) -> LoadedData {
        let raw = (0..n)
            .map(|i| {
                let p = 100.0 + i as f64;
                RawBar {
                    date: d(2024, 1, 1) + chrono::Duration::days(i as i64),
                    open: p,
                    high: p + 1.0,
                    low: p - 1.0,
                    close: p,
                    adj_close: p,
                    volume: 0,
                }
            })
            .collect();
        let bars = prepare_bars(symbol, raw).unwrap();
        LoadedData {
            symbol: symbol.to_string(),
            dataset_hash: dataset_hash(&bars),
            bars,
            source: DataSource::CsvImport,
        }
    }

    #[test]
    fn from_data_runs_crossover() {
        let config = BacktestConfig::daily_sma("NHY", d(2024, 1, 1), d(2024, 12, 31));
        let result =
            run_backtest_from_data(&config, &SymbolCatalog::builtin(), rising("NHY", 20)).unwrap();
        assert_eq!(result.name, "Norsk Hydro");
        assert_eq!(result.run.summary.trade_count, 1);
        assert_eq!(result.run.equity_curve.len(), 20);
        assert_eq!(result.fingerprint.bar_count, 20);
        assert!(!result.is_synthetic());
    }

    #[test]
    fn engine_errors_keep_their_fault() {
        let mut config = BacktestConfig::daily_sma("NHY", d(2024, 1, 1), d(2024, 12, 31));
        config.backtest.initial_capital = -1.0;
        let err = run_backtest_from_data(&config, &SymbolCatalog::builtin(), rising("NHY", 5))
            .unwrap_err();
        assert_eq!(err.fault(), Fault::Caller);
    }

    #[test]
    fn batch_preserves_order_and_isolates_failures() {
        let catalog = SymbolCatalog::builtin();
        let end = d(2024, 6, 28);
        let mut bad = BacktestConfig::weekly_vol_target("AKER", d(2021, 1, 1), end);
        bad.strategy.slow = 1;
        let configs = vec![
            BacktestConfig::weekly_vol_target("NHY", d(2021, 1, 1), end),
            bad,
            BacktestConfig::weekly_vol_target("EQNR", d(2021, 1, 1), end),
        ];
        let outcomes = run_batch(&configs, &catalog, None, &SourceKind::Synthetic { periods: 156 });

        let symbols: Vec<_> = outcomes.iter().map(|o| o.symbol.as_str()).collect();
        assert_eq!(symbols, ["NHY", "AKER", "EQNR"]);
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(outcomes[1].result, Err(RunError::Config(_))));
        assert!(outcomes[2].result.as_ref().unwrap().is_synthetic());
    }

    #[test]
    fn provider_failure_is_provider_fault() {
        use hindsight_core::data::{DataError, FetchResult, Interval};

        struct Down;
        impl DataProvider for Down {
            fn name(&self) -> &str {
                "down"
            }
            fn fetch(
                &self,
                symbol: &str,
                _: NaiveDate,
                _: NaiveDate,
                _: Interval,
            ) -> Result<FetchResult, DataError> {
                Err(DataError::NoData(symbol.to_string()))
            }
        }

        let config = BacktestConfig::daily_sma("EQNR", d(2024, 1, 1), d(2024, 6, 1));
        let err = run_single_backtest(
            &config,
            &SymbolCatalog::builtin(),
            Some(&Down),
            &SourceKind::Provider,
        )
        .unwrap_err();
        assert!(matches!(err, RunError::Data(_)));
        assert_eq!(err.fault(), Fault::Provider);
    }
}
