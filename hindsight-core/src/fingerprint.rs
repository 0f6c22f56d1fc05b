//! Run fingerprinting — deterministic identification of backtest runs.
//!
//! - config hash: blake3 over the canonical JSON of the run configuration
//! - dataset hash: blake3 over the prepared bars, field by field
//!
//! Two runs with equal fingerprints produce identical results.

use crate::domain::Bar;
use crate::error::BacktestError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub config_hash: String,
    pub dataset_hash: String,
    pub bar_count: usize,
}

impl RunFingerprint {
    pub fn compute<C: Serialize>(config: &C, bars: &[Bar]) -> Result<Self, BacktestError> {
        Ok(Self {
            config_hash: config_hash(config)?,
            dataset_hash: dataset_hash(bars),
            bar_count: bars.len(),
        })
    }

    /// Short identifier for directory names and log lines.
    pub fn short_id(&self) -> &str {
        let end = self.config_hash.len().min(12);
        &self.config_hash[..end]
    }
}

/// Hash any serializable configuration.
///
/// Struct fields serialize in declaration order, so equal configs hash equal.
pub fn config_hash<C: Serialize>(config: &C) -> Result<String, BacktestError> {
    let json = serde_json::to_vec(config)
        .map_err(|e| BacktestError::Computation(format!("config failed to serialize: {e}")))?;
    Ok(blake3::hash(&json).to_hex().to_string())
}

/// Hash the bar series that a run consumed.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.date.to_string().as_bytes());
        for v in [bar.open, bar.high, bar.low, bar.close, bar.adj_close] {
            hasher.update(&v.to_bits().to_le_bytes());
        }
        hasher.update(&bar.volume.to_le_bytes());
        let next = bar.next_open.map_or(u64::MAX, f64::to_bits);
        hasher.update(&next.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
