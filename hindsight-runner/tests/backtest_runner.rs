//! Integration tests for the runner: config files, CSV and synthetic sources,
//! determinism, and batch runs.

use std::io::Write;

use chrono::{Datelike, NaiveDate, Weekday};
use hindsight_core::data::{DataSource, Interval};
use hindsight_core::domain::ExitReason;
use hindsight_core::engine::DirectionPolicy;
use hindsight_core::Fault;
use hindsight_runner::{
    run_batch, run_single_backtest, BacktestConfig, RunError, SourceKind, SymbolCatalog,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn synthetic() -> SourceKind {
    SourceKind::Synthetic {
        periods: SourceKind::DEFAULT_SYNTHETIC_PERIODS,
    }
}

fn assert_closes(result: &hindsight_runner::BacktestResult) {
    let run = &result.run;
    let expected = run.summary.initial_equity + run.trades.iter().map(|t| t.pnl).sum::<f64>();
    let tol = 1e-6 * run.summary.initial_equity.abs().max(1.0);
    assert!(
        (run.summary.final_equity - expected).abs() <= tol,
        "final {} vs initial + pnl {}",
        run.summary.final_equity,
        expected
    );
}

/// Writes `<symbol>.csv` with a V-shaped close series: down, then up.
fn write_v_shape_csv(dir: &std::path::Path, symbol: &str) {
    let mut file = std::fs::File::create(dir.join(format!("{symbol}.csv"))).unwrap();
    writeln!(file, "Date,Open,High,Low,Close,Adj Close,Volume").unwrap();
    let start = d(2024, 1, 1);
    for i in 0..60i64 {
        let close = if i < 30 {
            130.0 - i as f64
        } else {
            100.0 + (i - 30) as f64
        };
        let date = start + chrono::Duration::days(i);
        writeln!(
            file,
            "{date},{close},{},{},{close},{close},1000",
            close + 1.0,
            close - 1.0
        )
        .unwrap();
    }
}

#[test]
fn weekly_preset_on_synthetic_data() {
    let config = BacktestConfig::weekly_vol_target("NHY", d(2021, 1, 1), d(2024, 6, 30));
    let result =
        run_single_backtest(&config, &SymbolCatalog::builtin(), None, &synthetic()).unwrap();

    assert!(result.is_synthetic());
    assert_eq!(result.name, "Norsk Hydro");
    assert_eq!(result.run.equity_curve.len(), 156);
    assert_eq!(result.run.equity_curve[0].equity, 100_000.0);
    assert!(result
        .bars
        .iter()
        .all(|b| b.date.weekday() == Weekday::Fri));
    assert_closes(&result);
}

#[test]
fn identical_inputs_give_identical_runs() {
    let catalog = SymbolCatalog::builtin();
    let mut config = BacktestConfig::weekly_vol_target("EQNR", d(2021, 1, 1), d(2024, 6, 30));
    config.backtest.direction = DirectionPolicy::LongShort;

    let a = run_single_backtest(&config, &catalog, None, &synthetic()).unwrap();
    let b = run_single_backtest(&config, &catalog, None, &synthetic()).unwrap();

    assert_eq!(a.fingerprint, b.fingerprint);
    assert_eq!(a.run, b.run);
}

#[test]
fn config_change_changes_run_id() {
    let catalog = SymbolCatalog::builtin();
    let config = BacktestConfig::weekly_vol_target("AKER", d(2021, 1, 1), d(2024, 6, 30));
    let mut tweaked = config.clone();
    tweaked.strategy.slow = 20;

    let a = run_single_backtest(&config, &catalog, None, &synthetic()).unwrap();
    let b = run_single_backtest(&tweaked, &catalog, None, &synthetic()).unwrap();

    assert_ne!(a.fingerprint.config_hash, b.fingerprint.config_hash);
    assert_eq!(a.fingerprint.dataset_hash, b.fingerprint.dataset_hash);
}

#[test]
fn toml_file_with_csv_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_v_shape_csv(dir.path(), "TEST");

    let config_path = dir.path().join("run.toml");
    std::fs::write(
        &config_path,
        r#"
[backtest]
symbol = "test"
start_date = "2024-01-01"
end_date = "2024-12-31"
interval = "daily"

[execution]
type = "fixed_fraction"
fraction = 0.95
"#,
    )
    .unwrap();

    let config = BacktestConfig::from_file(&config_path).unwrap();
    assert_eq!(config.backtest.symbol, "TEST");
    assert_eq!(config.backtest.interval, Interval::Daily);

    let result = run_single_backtest(
        &config,
        &SymbolCatalog::builtin(),
        None,
        &SourceKind::Csv(dir.path().to_path_buf()),
    )
    .unwrap();

    assert_eq!(result.source, DataSource::CsvImport);
    assert_eq!(result.name, "TEST");
    assert_eq!(result.run.equity_curve.len(), 60);
    // The fast average crosses above the slow one on the way up and the
    // position is still open at the end.
    assert_eq!(result.run.summary.trade_count, 1);
    let trade = &result.run.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::EndOfData);
    assert!(trade.entry_index > 30);
    assert!(trade.pnl > 0.0);
    assert!(result.run.diagnostics.forced_liquidation);
    assert_closes(&result);
}

#[test]
fn csv_range_outside_data_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_v_shape_csv(dir.path(), "TEST");
    let config = BacktestConfig::daily_sma("TEST", d(2030, 1, 1), d(2030, 12, 31));

    let err = run_single_backtest(
        &config,
        &SymbolCatalog::builtin(),
        None,
        &SourceKind::Csv(dir.path().to_path_buf()),
    )
    .unwrap_err();
    assert!(matches!(err, RunError::Data(_)), "{err}");
}

#[test]
fn missing_csv_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = BacktestConfig::daily_sma("NOPE", d(2024, 1, 1), d(2024, 12, 31));

    let err = run_single_backtest(
        &config,
        &SymbolCatalog::builtin(),
        None,
        &SourceKind::Csv(dir.path().to_path_buf()),
    )
    .unwrap_err();
    assert!(matches!(err, RunError::Data(_)));
}

#[test]
fn invalid_config_is_rejected_before_loading() {
    let config = BacktestConfig::daily_sma("NHY", d(2024, 6, 1), d(2024, 1, 1));

    let err = run_single_backtest(&config, &SymbolCatalog::builtin(), None, &synthetic())
        .unwrap_err();
    assert!(matches!(err, RunError::Config(_)));
    assert_eq!(err.fault(), Fault::Caller);
}

#[test]
fn batch_over_catalog() {
    let catalog = SymbolCatalog::builtin();
    let configs: Vec<_> = catalog
        .symbols()
        .map(|(symbol, _)| BacktestConfig::weekly_vol_target(symbol, d(2021, 1, 1), d(2024, 6, 30)))
        .collect();

    let outcomes = run_batch(&configs, &catalog, None, &synthetic());

    assert_eq!(outcomes.len(), catalog.len());
    for (outcome, config) in outcomes.iter().zip(&configs) {
        assert_eq!(outcome.symbol, config.backtest.symbol);
        let result = outcome.result.as_ref().unwrap();
        assert_closes(result);
    }
}
