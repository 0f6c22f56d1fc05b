//! Bar loading for the runner.
//!
//! Resolves the bars for one symbol from the source chosen by the caller:
//! 1. `Provider` → fetch from the market data provider (Yahoo by default)
//! 2. `Csv` → read a `Date,Open,High,Low,Close,Adj Close,Volume` file
//! 3. `Synthetic` → generate a seeded weekly log-normal walk
//!
//! Every path ends in `prepare_bars`, so the engine always sees sorted,
//! complete bars with the next open attached. Synthetic results are tagged.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{info, warn};

use hindsight_core::data::{prepare_bars, DataError, DataProvider, DataSource, Interval, RawBar};
use hindsight_core::domain::Bar;
use hindsight_core::fingerprint::dataset_hash;
use hindsight_core::Fault;

use crate::catalog::SymbolInfo;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },

    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path}: bad value on line {line}: {reason}")]
    BadRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("no data provider configured for '{symbol}'")]
    NoProvider { symbol: String },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

impl LoadError {
    /// Malformed local files are the caller's problem; anything the
    /// provider returned is the provider's.
    pub fn fault(&self) -> Fault {
        match self {
            LoadError::Csv { .. }
            | LoadError::MissingColumn { .. }
            | LoadError::BadRow { .. }
            | LoadError::NoProvider { .. } => Fault::Caller,
            LoadError::Data(DataError::Validation(_)) => Fault::Caller,
            LoadError::Data(_) => Fault::Provider,
        }
    }
}

/// Where to take bars from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    Provider,
    /// A CSV file, or a directory holding `<SYMBOL>.csv` files.
    Csv(PathBuf),
    Synthetic { periods: usize },
}

impl SourceKind {
    pub const DEFAULT_SYNTHETIC_PERIODS: usize = 156;
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Inclusive.
    pub start: NaiveDate,
    /// Inclusive. Synthetic series end on or before this date.
    pub end: NaiveDate,
    pub interval: Interval,
    pub source: SourceKind,
}

/// Prepared bars plus provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
    /// BLAKE3 over the prepared bars.
    pub dataset_hash: String,
}

impl LoadedData {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Load and prepare bars for one symbol.
pub fn load_bars(
    symbol: &str,
    symbol_info: &SymbolInfo,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
) -> Result<LoadedData, LoadError> {
    let (raw, source) = match &opts.source {
        SourceKind::Provider => {
            let provider = provider.ok_or_else(|| LoadError::NoProvider {
                symbol: symbol.to_string(),
            })?;
            let fetched = provider.fetch(symbol, opts.start, opts.end, opts.interval)?;
            (fetched.bars, fetched.source)
        }
        SourceKind::Csv(path) => {
            let file = csv_path_for(path, symbol);
            let raw = read_csv_bars(&file)?;
            let in_range: Vec<RawBar> = raw
                .into_iter()
                .filter(|b| b.date >= opts.start && b.date <= opts.end)
                .collect();
            (in_range, DataSource::CsvImport)
        }
        SourceKind::Synthetic { periods } => {
            warn!(symbol, "generating synthetic data; results are tagged as synthetic");
            let raw = generate_synthetic_bars(symbol_info, *periods, opts.end, opts.interval);
            (raw, DataSource::Synthetic)
        }
    };

    let bars = prepare_bars(symbol, raw)?;
    let dataset_hash = dataset_hash(&bars);
    info!(symbol, bars = bars.len(), source = ?source, "bars loaded");

    Ok(LoadedData {
        symbol: symbol.to_string(),
        bars,
        source,
        dataset_hash,
    })
}

fn csv_path_for(path: &Path, symbol: &str) -> PathBuf {
    if path.is_dir() {
        path.join(format!("{symbol}.csv"))
    } else {
        path.to_path_buf()
    }
}

// ─── CSV ────────────────────────────────────────────────────────────

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    adj_close: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord, path: &Path) -> Result<Self, LoadError> {
        let find = |names: &[&str]| {
            headers.iter().position(|h| {
                let key: String = h
                    .chars()
                    .filter(|c| !c.is_whitespace() && *c != '_')
                    .collect::<String>()
                    .to_ascii_lowercase();
                names.contains(&key.as_str())
            })
        };
        let required = |names: &[&str], column: &'static str| {
            find(names).ok_or_else(|| LoadError::MissingColumn {
                path: path.to_path_buf(),
                column,
            })
        };
        Ok(Self {
            date: required(&["date"], "Date")?,
            open: required(&["open"], "Open")?,
            high: required(&["high"], "High")?,
            low: required(&["low"], "Low")?,
            close: required(&["close"], "Close")?,
            adj_close: find(&["adjclose"]),
            volume: find(&["volume"]),
        })
    }
}

/// Read raw bars from a CSV file.
///
/// Empty price cells become NaN and are dropped during preparation. A missing
/// `Adj Close` column falls back to `Close`; a missing volume is 0.
pub fn read_csv_bars(path: &Path) -> Result<Vec<RawBar>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let cols = Columns::resolve(reader.headers().map_err(csv_err)?, path)?;
    if cols.adj_close.is_none() {
        warn!(path = %path.display(), "no Adj Close column; using Close for signals");
    }

    let mut bars = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let line = record.position().map_or(0, |p| p.line());
        let bad = |reason: String| LoadError::BadRow {
            path: path.to_path_buf(),
            line,
            reason,
        };

        let date_str = record.get(cols.date).unwrap_or("");
        let date = parse_date(date_str).ok_or_else(|| bad(format!("unparseable date '{date_str}'")))?;
        let price = |idx: usize| -> Result<f64, LoadError> {
            match record.get(idx).unwrap_or("") {
                "" | "null" | "NaN" | "nan" => Ok(f64::NAN),
                s => s
                    .parse::<f64>()
                    .map_err(|_| bad(format!("unparseable number '{s}'"))),
            }
        };

        let close = price(cols.close)?;
        let adj_close = match cols.adj_close {
            Some(idx) => price(idx)?,
            None => close,
        };
        let volume = match cols.volume {
            Some(idx) => {
                let v = price(idx)?;
                if v.is_finite() && v > 0.0 {
                    v.round() as u64
                } else {
                    0
                }
            }
            None => 0,
        };

        bars.push(RawBar {
            date,
            open: price(cols.open)?,
            high: price(cols.high)?,
            low: price(cols.low)?,
            close,
            adj_close,
            volume,
        });
    }
    Ok(bars)
}

/// Dates as `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

// ─── Synthetic ──────────────────────────────────────────────────────

const SYNTHETIC_VOL: f64 = 0.03;

/// Generate a deterministic synthetic series ending on or before `end`.
///
/// Weekly series are stamped on Fridays, daily series on weekdays.
/// close[t] = base × exp(Σ (drift + vol·N)); open[t] = close[t−1] × (1 + 0.002·N),
/// with open[0] based on close[0]; high/low widen max/min(open, close) by up to 1%.
pub fn generate_synthetic_bars(
    info: &SymbolInfo,
    periods: usize,
    end: NaiveDate,
    interval: Interval,
) -> Vec<RawBar> {
    let mut rng = StdRng::seed_from_u64(info.seed);
    let dates = synthetic_dates(periods, end, interval);

    let mut log_price = info.base_price.ln();
    let closes: Vec<f64> = (0..periods)
        .map(|_| {
            log_price += info.drift + SYNTHETIC_VOL * standard_normal(&mut rng);
            log_price.exp()
        })
        .collect();
    let opens: Vec<f64> = (0..periods)
        .map(|i| {
            let prev = if i == 0 { closes[0] } else { closes[i - 1] };
            prev * (1.0 + 0.002 * standard_normal(&mut rng))
        })
        .collect();
    let high_noise: Vec<f64> = (0..periods).map(|_| rng.gen::<f64>()).collect();
    let low_noise: Vec<f64> = (0..periods).map(|_| rng.gen::<f64>()).collect();

    dates
        .into_iter()
        .enumerate()
        .map(|(i, date)| {
            let (open, close) = (opens[i], closes[i]);
            RawBar {
                date,
                open,
                high: open.max(close) * (1.0 + 0.01 * high_noise[i]),
                low: open.min(close) * (1.0 - 0.01 * low_noise[i]),
                close,
                adj_close: close,
                volume: 0,
            }
        })
        .collect()
}

fn synthetic_dates(periods: usize, end: NaiveDate, interval: Interval) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(periods);
    let mut current = match interval {
        Interval::Weekly => {
            let back = (end.weekday().num_days_from_monday() + 7
                - Weekday::Fri.num_days_from_monday())
                % 7;
            end - Duration::days(back as i64)
        }
        Interval::Daily => end,
    };
    while dates.len() < periods {
        match interval {
            Interval::Weekly => {
                dates.push(current);
                current -= Duration::weeks(1);
            }
            Interval::Daily => {
                if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                    dates.push(current);
                }
                current -= Duration::days(1);
            }
        }
    }
    dates.reverse();
    dates
}

/// Box-Muller transform.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
