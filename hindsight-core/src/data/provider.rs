//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over remote market-data sources so the
//! runner can swap implementations and mock them in tests. Providers own any
//! retry policy; the engine never retries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw OHLCV row from a data source, before preparation.
///
/// Missing prices are NaN; preparation drops such rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// Bar interval requested from a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    #[default]
    Daily,
    Weekly,
}

impl Interval {
    /// Interval code understood by the Yahoo chart API.
    pub fn code(self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
        }
    }

    pub fn bars_per_year(self) -> f64 {
        match self {
            Interval::Daily => 252.0,
            Interval::Weekly => 52.0,
        }
    }
}

impl std::str::FromStr for Interval {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "1d" | "d" => Ok(Interval::Daily),
            "weekly" | "1wk" | "w" => Ok(Interval::Weekly),
            other => Err(DataError::Validation(format!("unsupported interval '{other}'"))),
        }
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no usable price rows for {0}")]
    NoData(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<RawBar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch bars for a symbol over an inclusive date range.
    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<FetchResult, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_parses_codes_and_names() {
        assert_eq!("1wk".parse::<Interval>().unwrap(), Interval::Weekly);
        assert_eq!("Daily".parse::<Interval>().unwrap(), Interval::Daily);
        assert!("1h".parse::<Interval>().is_err());
        assert_eq!(Interval::Weekly.code(), "1wk");
        assert_eq!(Interval::Daily.bars_per_year(), 252.0);
    }
}
