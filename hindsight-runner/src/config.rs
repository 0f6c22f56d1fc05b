//! Serializable backtest configuration.
//!
//! A run is described by a TOML file:
//!
//! ```toml
//! atr_period = 14
//!
//! [backtest]
//! symbol = "EQNR"
//! start_date = "2022-01-01"
//! end_date = "2024-12-31"
//! interval = "weekly"
//! initial_capital = 100000.0
//! direction = "long_short"
//!
//! [execution]
//! type = "volatility_targeted"
//! target_annual_vol = 0.20
//! bars_per_year = 52.0
//!
//! [trailing_stop]
//! atr_multiple = 3.0
//!
//! [strategy]
//! fast = 5
//! slow = 15
//!
//! [regime]
//! period = 40
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hindsight_core::components::{RegimeFilter, SmaCrossover};
use hindsight_core::data::Interval;
use hindsight_core::domain::Bar;
use hindsight_core::engine::{DirectionPolicy, EngineConfig, ExecutionPolicy, TrailingStop};
use hindsight_core::sizers::{FixedFraction, VolatilityTargeted};
use hindsight_core::{BacktestError, Fault};

use crate::catalog::normalize_symbol;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("unknown preset '{0}' (valid: daily_sma, weekly_vol_target)")]
    UnknownPreset(String),
}

impl ConfigError {
    pub fn fault(&self) -> Fault {
        Fault::Caller
    }
}

impl From<BacktestError> for ConfigError {
    fn from(e: BacktestError) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

/// Full configuration for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default = "default_atr_period")]
    pub atr_period: usize,
    pub backtest: BacktestSection,
    pub execution: ExecutionPolicy,
    #[serde(default)]
    pub trailing_stop: Option<TrailingStop>,
    #[serde(default)]
    pub strategy: StrategySection,
    #[serde(default)]
    pub regime: Option<RegimeSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    pub symbol: String,
    /// Inclusive.
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    #[serde(default)]
    pub interval: Interval,
    #[serde(default = "default_capital")]
    pub initial_capital: f64,
    #[serde(default)]
    pub direction: DirectionPolicy,
}

/// SMA crossover parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategySection {
    pub fast: usize,
    pub slow: usize,
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            fast: SmaCrossover::DEFAULT_FAST,
            slow: SmaCrossover::DEFAULT_SLOW,
        }
    }
}

/// Price-vs-SMA directional filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeSection {
    pub period: usize,
}

fn default_atr_period() -> usize {
    EngineConfig::DEFAULT_ATR_PERIOD
}

fn default_capital() -> f64 {
    EngineConfig::DEFAULT_CAPITAL
}

impl BacktestConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(s)?;
        config.backtest.symbol = normalize_symbol(&config.backtest.symbol);
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&s)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Daily long-only SMA crossover, 95% of cash per entry.
    pub fn daily_sma(symbol: &str, start: NaiveDate, end: NaiveDate) -> Self {
        let engine = EngineConfig::daily();
        Self {
            atr_period: engine.atr_period,
            backtest: BacktestSection {
                symbol: normalize_symbol(symbol),
                start_date: start,
                end_date: end,
                interval: Interval::Daily,
                initial_capital: engine.initial_capital,
                direction: DirectionPolicy::LongOnly,
            },
            execution: ExecutionPolicy::FixedFraction(FixedFraction::default()),
            trailing_stop: None,
            strategy: StrategySection::default(),
            regime: None,
        }
    }

    /// Weekly SMA crossover sized to 20% annualised volatility.
    pub fn weekly_vol_target(symbol: &str, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            backtest: BacktestSection {
                interval: Interval::Weekly,
                ..Self::daily_sma(symbol, start, end).backtest
            },
            execution: ExecutionPolicy::VolatilityTargeted(VolatilityTargeted::weekly()),
            ..Self::daily_sma(symbol, start, end)
        }
    }

    pub fn preset(name: &str, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Self, ConfigError> {
        let config = match name {
            "daily_sma" => Self::daily_sma(symbol, start, end),
            "weekly_vol_target" => Self::weekly_vol_target(symbol, start, end),
            other => return Err(ConfigError::UnknownPreset(other.to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backtest.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if self.backtest.end_date < self.backtest.start_date {
            return Err(ConfigError::Invalid(format!(
                "end_date {} is before start_date {}",
                self.backtest.end_date, self.backtest.start_date
            )));
        }
        if let Some(regime) = self.regime {
            if regime.period == 0 {
                return Err(ConfigError::Invalid("regime period must be >= 1".into()));
            }
        }
        self.signal_generator()?;
        self.engine_config().validate()?;
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            initial_capital: self.backtest.initial_capital,
            execution: self.execution,
            direction: self.backtest.direction,
            trailing_stop: self.trailing_stop,
            atr_period: self.atr_period,
        }
    }

    /// Crossover generator; short signals are emitted only when shorts are allowed.
    pub fn signal_generator(&self) -> Result<SmaCrossover, ConfigError> {
        Ok(SmaCrossover::new(
            self.strategy.fast,
            self.strategy.slow,
            self.backtest.direction.allows_short(),
        )?)
    }

    pub fn regime_filter(&self, bars: &[Bar]) -> Result<Option<RegimeFilter>, ConfigError> {
        self.regime
            .map(|r| RegimeFilter::sma_regime(bars, r.period))
            .transpose()
            .map_err(ConfigError::from)
    }
}
