//! Output report — the JSON document a run is published as.
//!
//! Keys are camelCase. Currency values are rounded to 2 decimals, share counts
//! to 4, and trade returns are reported as percentages.

use serde::{Deserialize, Serialize};

use hindsight_core::data::DataSource;
use hindsight_core::domain::{Bar, EquityPoint, ExitReason, PositionSide, Trade};
use hindsight_core::engine::{RunDiagnostics, Summary};

use crate::runner::BacktestResult;

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub name: String,
    pub summary: SummaryReport,
    pub equity_curve: Vec<EquityRow>,
    pub trades: Vec<TradeRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_history: Option<Vec<PriceRow>>,
    pub data_source: DataSource,
    pub run_id: String,
    pub dataset_hash: String,
    pub diagnostics: RunDiagnostics,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub initial_equity: f64,
    pub final_equity: f64,
    pub total_return_pct: f64,
    pub trade_count: usize,
    pub win_rate_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityRow {
    pub date: String,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRow {
    pub side: PositionSide,
    pub entry_date: String,
    pub exit_date: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: f64,
    pub pnl: f64,
    /// Percent of cost basis.
    pub return_pct: f64,
    pub exit_reason: ExitReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRow {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
    pub next_open: Option<f64>,
}

impl BacktestReport {
    pub fn from_result(result: &BacktestResult, include_prices: bool) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            symbol: result.symbol.clone(),
            name: result.name.clone(),
            summary: SummaryReport::from(&result.run.summary),
            equity_curve: result.run.equity_curve.iter().map(EquityRow::from).collect(),
            trades: result.run.trades.iter().map(TradeRow::from).collect(),
            price_history: include_prices.then(|| result.bars.iter().map(PriceRow::from).collect()),
            data_source: result.source,
            run_id: result.fingerprint.config_hash.clone(),
            dataset_hash: result.fingerprint.dataset_hash.clone(),
            diagnostics: result.run.diagnostics.clone(),
        }
    }
}

impl From<&Summary> for SummaryReport {
    fn from(s: &Summary) -> Self {
        Self {
            initial_equity: round2(s.initial_equity),
            final_equity: round2(s.final_equity),
            total_return_pct: round2(s.total_return_pct),
            trade_count: s.trade_count,
            win_rate_pct: round2(s.win_rate_pct),
        }
    }
}

impl From<&EquityPoint> for EquityRow {
    fn from(p: &EquityPoint) -> Self {
        Self {
            date: p.date.to_string(),
            equity: round2(p.equity),
        }
    }
}

impl From<&Trade> for TradeRow {
    fn from(t: &Trade) -> Self {
        Self {
            side: t.side,
            entry_date: t.entry_date.to_string(),
            exit_date: t.exit_date.to_string(),
            entry_price: round2(t.entry_price),
            exit_price: round2(t.exit_price),
            shares: round4(t.shares),
            pnl: round2(t.pnl),
            return_pct: round2(t.return_pct * 100.0),
            exit_reason: t.exit_reason,
        }
    }
}

impl From<&Bar> for PriceRow {
    fn from(b: &Bar) -> Self {
        Self {
            date: b.date.to_string(),
            open: round2(b.open),
            high: round2(b.high),
            low: round2(b.low),
            close: round2(b.close),
            adj_close: round2(b.adj_close),
            volume: b.volume,
            next_open: b.next_open.map(round2),
        }
    }
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
