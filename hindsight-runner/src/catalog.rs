//! Symbol catalog: display names and synthetic-data parameters per symbol.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Per-symbol metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    /// Seed for the synthetic price path.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_base_price")]
    pub base_price: f64,
    /// Mean log return per bar.
    #[serde(default = "default_drift")]
    pub drift: f64,
}

fn default_seed() -> u64 {
    1
}

fn default_base_price() -> f64 {
    100.0
}

fn default_drift() -> f64 {
    0.001
}

impl SymbolInfo {
    /// Fallback for symbols not in the catalog: named after the symbol itself.
    pub fn unlisted(symbol: &str) -> Self {
        Self {
            name: symbol.to_string(),
            seed: default_seed(),
            base_price: default_base_price(),
            drift: default_drift(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolCatalog {
    #[serde(default)]
    pub symbols: BTreeMap<String, SymbolInfo>,
}

impl SymbolCatalog {
    /// The Oslo Børs symbols the tool ships with.
    pub fn builtin() -> Self {
        let mut symbols = BTreeMap::new();
        for (symbol, name, seed, base_price, drift) in [
            ("NHY", "Norsk Hydro", 11, 70.0, 0.0015),
            ("EQNR", "Equinor", 23, 300.0, 0.001),
            ("AKER", "Aker ASA", 37, 800.0, 0.0008),
        ] {
            symbols.insert(
                symbol.to_string(),
                SymbolInfo {
                    name: name.to_string(),
                    seed,
                    base_price,
                    drift,
                },
            );
        }
        Self { symbols }
    }

    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let parsed: Self = toml::from_str(s)?;
        let symbols = parsed
            .symbols
            .into_iter()
            .map(|(k, v)| (normalize_symbol(&k), v))
            .collect();
        Ok(Self { symbols })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&s)
    }

    pub fn get(&self, symbol: &str) -> Option<&SymbolInfo> {
        self.symbols.get(&normalize_symbol(symbol))
    }

    /// Catalog entry, or the unlisted fallback.
    pub fn info(&self, symbol: &str) -> SymbolInfo {
        self.get(symbol)
            .cloned()
            .unwrap_or_else(|| SymbolInfo::unlisted(&normalize_symbol(symbol)))
    }

    pub fn display_name(&self, symbol: &str) -> String {
        self.info(symbol).name
    }

    pub fn symbols(&self) -> impl Iterator<Item = (&str, &SymbolInfo)> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Trimmed, upper-case ticker.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
