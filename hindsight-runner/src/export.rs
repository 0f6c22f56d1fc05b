//! Artifact export — JSON report plus CSV trade tape and equity curve.
//!
//! Each run is saved to its own directory named `<SYMBOL>_<run id prefix>`:
//! - `report.json`: the full output report
//! - `trades.csv`: one row per completed trade
//! - `equity.csv`: one row per bar
//!
//! Reports carry a `schemaVersion`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use hindsight_core::domain::{EquityPoint, Trade};

use crate::report::{BacktestReport, SCHEMA_VERSION};
use crate::runner::BacktestResult;

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize report to JSON")
}

/// Deserialize a report, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize report from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV ────────────────────────────────────────────────────────────

/// Columns: side, entry_bar, entry_date, entry_price, exit_bar, exit_date,
/// exit_price, shares, pnl, return_pct, bars_held, exit_reason
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "side",
        "entry_bar",
        "entry_date",
        "entry_price",
        "exit_bar",
        "exit_date",
        "exit_price",
        "shares",
        "pnl",
        "return_pct",
        "bars_held",
        "exit_reason",
    ])?;

    for t in trades {
        wtr.write_record([
            &format!("{:?}", t.side).to_lowercase(),
            &t.entry_index.to_string(),
            &t.entry_date.to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_index.to_string(),
            &t.exit_date.to_string(),
            &format!("{:.6}", t.exit_price),
            &format!("{:.4}", t.shares),
            &format!("{:.2}", t.pnl),
            &format!("{:.4}", t.return_pct * 100.0),
            &t.bars_held().to_string(),
            &serde_json::to_value(t.exit_reason)?
                .as_str()
                .unwrap_or_default()
                .to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar_index", "date", "equity"])?;
    for (i, point) in equity_curve.iter().enumerate() {
        wtr.write_record([
            &i.to_string(),
            &point.date.to_string(),
            &format!("{:.2}", point.equity),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact directory ─────────────────────────────────────────────

/// Write the artifact set for one run and return its directory.
pub fn save_artifacts(
    result: &BacktestResult,
    output_dir: &Path,
    include_prices: bool,
) -> Result<PathBuf> {
    let run_dir = output_dir.join(format!("{}_{}", result.symbol, result.fingerprint.short_id()));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let report = BacktestReport::from_result(result, include_prices);
    std::fs::write(run_dir.join("report.json"), export_json(&report)?)?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&result.run.trades)?)?;
    std::fs::write(
        run_dir.join("equity.csv"),
        export_equity_csv(&result.run.equity_curve)?,
    )?;

    info!(symbol = %result.symbol, dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load the report from an artifact directory.
pub fn load_report(dir: &Path) -> Result<BacktestReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
