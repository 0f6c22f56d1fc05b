//! Market data: provider contract, Yahoo provider, bar preparation.

pub mod prepare;
pub mod provider;
pub mod yahoo;

pub use prepare::prepare_bars;
pub use provider::{DataError, DataProvider, DataSource, FetchResult, Interval, RawBar};
pub use yahoo::YahooProvider;
