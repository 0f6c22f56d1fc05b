//! Hindsight Core — domain types, indicators, sizing, and the execution simulator.
//!
//! This crate contains the heart of the backtest engine:
//! - Domain types (bars, orders, positions, trades, equity points)
//! - Indicator library (SMA, ATR)
//! - Signal contract and the SMA crossover reference generator
//! - Directional regime filter
//! - Position sizers (fixed fraction, volatility targeted)
//! - Bar-by-bar execution simulator with cash ledger and summary
//! - Market data provider contract, Yahoo provider, bar preparation
//! - Run fingerprinting

pub mod components;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod indicators;
pub mod sizers;

pub use error::{BacktestError, Fault, IndicatorError};
