//! Artifact round trips: run, save, reload, and inspect the published shape.

use chrono::NaiveDate;
use hindsight_runner::report::SCHEMA_VERSION;
use hindsight_runner::{
    load_report, run_single_backtest, save_artifacts, BacktestConfig, BacktestReport,
    BacktestResult, SourceKind, SymbolCatalog,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn weekly_run(symbol: &str) -> BacktestResult {
    let config = BacktestConfig::weekly_vol_target(symbol, d(2021, 1, 1), d(2024, 6, 30));
    run_single_backtest(
        &config,
        &SymbolCatalog::builtin(),
        None,
        &SourceKind::Synthetic { periods: 156 },
    )
    .unwrap()
}

#[test]
fn save_then_load_round_trips() {
    let result = weekly_run("NHY");
    let out = tempfile::tempdir().unwrap();

    let dir = save_artifacts(&result, out.path(), true).unwrap();
    assert!(dir.join("report.json").exists());
    assert!(dir.join("trades.csv").exists());
    assert!(dir.join("equity.csv").exists());
    let dir_name = dir.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(dir_name, format!("NHY_{}", result.fingerprint.short_id()));

    let loaded = load_report(&dir).unwrap();
    assert_eq!(loaded, BacktestReport::from_result(&result, true));
    assert_eq!(loaded.schema_version, SCHEMA_VERSION);
}

#[test]
fn csv_artifacts_have_one_row_per_item() {
    let result = weekly_run("EQNR");
    let out = tempfile::tempdir().unwrap();
    let dir = save_artifacts(&result, out.path(), false).unwrap();

    let equity = std::fs::read_to_string(dir.join("equity.csv")).unwrap();
    assert_eq!(equity.lines().count(), result.run.equity_curve.len() + 1);

    let trades = std::fs::read_to_string(dir.join("trades.csv")).unwrap();
    assert_eq!(trades.lines().count(), result.run.trades.len() + 1);
    assert!(trades.starts_with("side,entry_bar,entry_date"));
}

#[test]
fn report_json_uses_published_keys() {
    let result = weekly_run("AKER");
    let report = BacktestReport::from_result(&result, false);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["symbol"], "AKER");
    assert_eq!(json["name"], "Aker ASA");
    assert_eq!(json["dataSource"], "synthetic");
    assert_eq!(json["summary"]["initialEquity"], 100_000.0);
    assert!(json["summary"]["finalEquity"].is_number());
    assert!(json["summary"]["winRatePct"].is_number());
    assert_eq!(
        json["equityCurve"].as_array().unwrap().len(),
        result.run.equity_curve.len()
    );
    assert!(json["equityCurve"][0]["date"].is_string());
    assert!(json.get("priceHistory").is_none());
    assert_eq!(json["runId"], result.fingerprint.config_hash.as_str());
}

#[test]
fn price_history_is_opt_in() {
    let result = weekly_run("NHY");
    let with = BacktestReport::from_result(&result, true);
    let prices = with.price_history.unwrap();
    assert_eq!(prices.len(), result.bars.len());
    assert!(prices.last().unwrap().next_open.is_none());
    assert!(prices[0].next_open.is_some());
}

#[test]
fn loading_a_missing_directory_fails() {
    let out = tempfile::tempdir().unwrap();
    assert!(load_report(&out.path().join("nothing_here")).is_err());
}
