//! Hindsight CLI — rule-based backtests from the command line.
//!
//! Commands:
//! - `run`: execute one backtest from a TOML config file or named preset
//! - `batch`: run a preset over several symbols in parallel
//! - `symbols`: list the symbol catalog

mod logging;

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use hindsight_core::data::{DataProvider, YahooProvider};
use hindsight_runner::export::export_json;
use hindsight_runner::{
    normalize_symbol, run_batch, run_single_backtest, save_artifacts, BacktestConfig,
    BacktestReport, BacktestResult, SourceKind, SymbolCatalog,
};
use tracing::error;

use crate::logging::{init_logging, LogFormat};

const DEFAULT_PRESET: &str = "weekly_vol_target";

#[derive(Parser)]
#[command(name = "hindsight", about = "Hindsight: rule-based backtest engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Symbol catalog TOML. Defaults to the built-in catalog.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file or named preset.
    Run {
        /// Path to a TOML config file.
        #[arg(long, conflicts_with = "preset")]
        config: Option<PathBuf>,

        /// Named preset: daily_sma, weekly_vol_target.
        #[arg(long)]
        preset: Option<String>,

        /// Symbol. Required with --preset, overrides the config file otherwise.
        #[arg(long)]
        symbol: Option<String>,

        #[command(flatten)]
        dates: DateArgs,

        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Print the JSON report to stdout instead of the summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Run a preset over several symbols in parallel.
    Batch {
        /// Symbols to run. Defaults to every catalog symbol.
        symbols: Vec<String>,

        /// Named preset: daily_sma, weekly_vol_target.
        #[arg(long, default_value = DEFAULT_PRESET)]
        preset: String,

        #[command(flatten)]
        dates: DateArgs,

        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// List the symbol catalog.
    Symbols,
}

#[derive(Args)]
struct DateArgs {
    /// Start date (YYYY-MM-DD). Defaults to 3 years before the end date.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end: Option<String>,
}

#[derive(Args)]
struct DataArgs {
    /// Where bars come from.
    #[arg(long, value_enum, default_value_t = SourceArg::Yahoo)]
    source: SourceArg,

    /// CSV file or directory of `<SYMBOL>.csv` files (with --source csv).
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Number of synthetic bars (with --source synthetic).
    #[arg(long, default_value_t = SourceKind::DEFAULT_SYNTHETIC_PERIODS)]
    periods: usize,
}

#[derive(Args)]
struct OutputArgs {
    /// Output directory for run artifacts.
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Leave the raw price series out of the report.
    #[arg(long, default_value_t = false)]
    no_price_history: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    Yahoo,
    Csv,
    Synthetic,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format)?;

    let catalog = match &cli.catalog {
        Some(path) => SymbolCatalog::from_file(path)?,
        None => SymbolCatalog::builtin(),
    };

    match cli.command {
        Commands::Run {
            config,
            preset,
            symbol,
            dates,
            data,
            output,
            json,
        } => run_cmd(&catalog, config, preset, symbol, &dates, &data, &output, json),
        Commands::Batch {
            symbols,
            preset,
            dates,
            data,
            output,
        } => batch_cmd(&catalog, symbols, &preset, &dates, &data, &output),
        Commands::Symbols => {
            symbols_cmd(&catalog);
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_cmd(
    catalog: &SymbolCatalog,
    config_path: Option<PathBuf>,
    preset: Option<String>,
    symbol: Option<String>,
    dates: &DateArgs,
    data: &DataArgs,
    output: &OutputArgs,
    json: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            let mut config = BacktestConfig::from_file(&path)?;
            if let Some(symbol) = &symbol {
                config.backtest.symbol = normalize_symbol(symbol);
            }
            if let Some(start) = parse_date(dates.start.as_deref())? {
                config.backtest.start_date = start;
            }
            if let Some(end) = parse_date(dates.end.as_deref())? {
                config.backtest.end_date = end;
            }
            config.validate()?;
            config
        }
        None => {
            let symbol = symbol.ok_or_else(|| anyhow!("--symbol is required with --preset"))?;
            let (start, end) = date_range(dates)?;
            let name = preset.as_deref().unwrap_or(DEFAULT_PRESET);
            BacktestConfig::preset(name, &symbol, start, end)?
        }
    };

    let yahoo = provider_for(data)?;
    let provider = yahoo.as_ref().map(|p| p as &dyn DataProvider);
    let result = run_single_backtest(&config, catalog, provider, &source_kind(data)?)
        .with_context(|| format!("backtest failed for {}", config.backtest.symbol))?;

    let include_prices = !output.no_price_history;
    if json {
        println!(
            "{}",
            export_json(&BacktestReport::from_result(&result, include_prices))?
        );
    } else {
        print_summary(&result);
    }

    let run_dir = save_artifacts(&result, &output.output_dir, include_prices)?;
    if !json {
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn batch_cmd(
    catalog: &SymbolCatalog,
    symbols: Vec<String>,
    preset: &str,
    dates: &DateArgs,
    data: &DataArgs,
    output: &OutputArgs,
) -> Result<()> {
    let symbols: Vec<String> = if symbols.is_empty() {
        catalog.symbols().map(|(s, _)| s.to_string()).collect()
    } else {
        symbols
    };
    if symbols.is_empty() {
        bail!("no symbols given and the catalog is empty");
    }

    let (start, end) = date_range(dates)?;
    let configs = symbols
        .iter()
        .map(|s| BacktestConfig::preset(preset, s, start, end))
        .collect::<Result<Vec<_>, _>>()?;

    let yahoo = provider_for(data)?;
    let provider = yahoo.as_ref().map(|p| p as &dyn DataProvider);
    let outcomes = run_batch(&configs, catalog, provider, &source_kind(data)?);

    println!();
    println!(
        "{:<8} {:<20} {:>14} {:>10} {:>7} {:>9}",
        "Symbol", "Name", "Final Equity", "Return", "Trades", "Win Rate"
    );
    println!("{}", "-".repeat(73));

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(result) => {
                let s = &result.run.summary;
                println!(
                    "{:<8} {:<20} {:>14.2} {:>9.2}% {:>7} {:>8.1}%{}",
                    result.symbol,
                    result.name,
                    s.final_equity,
                    s.total_return_pct,
                    s.trade_count,
                    s.win_rate_pct,
                    if result.is_synthetic() { "  (synthetic)" } else { "" }
                );
                save_artifacts(result, &output.output_dir, !output.no_price_history)?;
            }
            Err(e) => {
                failed += 1;
                error!(symbol = %outcome.symbol, fault = ?e.fault(), "{e}");
                println!("{:<8} FAILED: {e}", outcome.symbol);
            }
        }
    }
    println!();

    if failed > 0 {
        eprintln!("{failed} of {} run(s) failed", outcomes.len());
        std::process::exit(1);
    }
    Ok(())
}

fn symbols_cmd(catalog: &SymbolCatalog) {
    println!("{:<8} {:<24} {:>6} {:>10} {:>8}", "Symbol", "Name", "Seed", "Base", "Drift");
    println!("{}", "-".repeat(60));
    for (symbol, info) in catalog.symbols() {
        println!(
            "{:<8} {:<24} {:>6} {:>10.2} {:>8.4}",
            symbol, info.name, info.seed, info.base_price, info.drift
        );
    }
}

fn provider_for(data: &DataArgs) -> Result<Option<YahooProvider>> {
    match data.source {
        SourceArg::Yahoo => Ok(Some(YahooProvider::new()?)),
        SourceArg::Csv | SourceArg::Synthetic => Ok(None),
    }
}

fn source_kind(data: &DataArgs) -> Result<SourceKind> {
    Ok(match data.source {
        SourceArg::Yahoo => SourceKind::Provider,
        SourceArg::Csv => SourceKind::Csv(
            data.csv
                .clone()
                .ok_or_else(|| anyhow!("--csv is required with --source csv"))?,
        ),
        SourceArg::Synthetic => SourceKind::Synthetic {
            periods: data.periods,
        },
    })
}

fn parse_date(s: Option<&str>) -> Result<Option<NaiveDate>> {
    s.map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
    })
    .transpose()
}

fn date_range(dates: &DateArgs) -> Result<(NaiveDate, NaiveDate)> {
    let end = parse_date(dates.end.as_deref())?.unwrap_or_else(|| chrono::Local::now().date_naive());
    let start = parse_date(dates.start.as_deref())?
        .unwrap_or_else(|| end - chrono::Duration::weeks(156));
    Ok((start, end))
}

fn print_summary(result: &BacktestResult) {
    let s = &result.run.summary;
    let d = &result.run.diagnostics;
    println!();
    println!("=== Backtest Result ===");
    println!("Symbol:         {} ({})", result.symbol, result.name);
    if let (Some(first), Some(last)) = (result.bars.first(), result.bars.last()) {
        println!("Period:         {} to {}", first.date, last.date);
    }
    println!("Bars:           {}", result.bars.len());
    println!("Run ID:         {}", result.fingerprint.short_id());
    println!();
    println!("--- Performance ---");
    println!("Initial Equity: {:.2}", s.initial_equity);
    println!("Final Equity:   {:.2}", s.final_equity);
    println!("Total Return:   {:.2}%", s.total_return_pct);
    println!("Trades:         {}", s.trade_count);
    println!("Win Rate:       {:.1}%", s.win_rate_pct);
    if d.dropped_orders > 0 || d.invalid_bars > 0 {
        println!();
        println!(
            "Dropped orders: {}, invalid bars: {}",
            d.dropped_orders, d.invalid_bars
        );
    }
    if result.is_synthetic() {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}
