//! Bar — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// OHLCV bar for one interval (a trading day or a week).
///
/// `next_open` is the following bar's open, attached during preparation so
/// the engine can size an order against the price it will actually fill at
/// without reaching forward into the bar sequence. It is `None` on the last bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    #[serde(default)]
    pub volume: u64,
    #[serde(default)]
    pub next_open: Option<f64>,
}

impl Bar {
    /// True when every price the engine reads on this bar is finite and positive.
    ///
    /// Bars failing this check are skipped by signal evaluation and order
    /// scheduling; equity carries forward across them.
    pub fn has_valid_prices(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.adj_close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
    }

    /// The open price if it can be filled against.
    pub fn fillable_open(&self) -> Option<f64> {
        usable_price(self.open)
    }

    /// The attached next-bar open if it can be filled against.
    pub fn fillable_next_open(&self) -> Option<f64> {
        self.next_open.and_then(usable_price)
    }
}

fn usable_price(price: f64) -> Option<f64> {
    (price.is_finite() && price > 0.0).then_some(price)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            adj_close: 103.0,
            volume: 50_000,
            next_open: Some(104.0),
        }
    }

    #[test]
    fn nan_open_is_invalid() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(!bar.has_valid_prices());
        assert_eq!(bar.fillable_open(), None);
    }

    #[test]
    fn zero_price_is_not_fillable() {
        let mut bar = sample_bar();
        bar.next_open = Some(0.0);
        assert_eq!(bar.fillable_next_open(), None);
        bar.next_open = None;
        assert_eq!(bar.fillable_next_open(), None);
        assert_eq!(bar.fillable_open(), Some(100.0));
    }

    #[test]
    fn volume_and_next_open_default_when_absent() {
        let json = r#"{"date":"2024-01-02","open":1.0,"high":2.0,"low":0.5,"close":1.5,"adj_close":1.5}"#;
        let bar: Bar = serde_json::from_str(json).unwrap();
        assert_eq!(bar.volume, 0);
        assert_eq!(bar.next_open, None);
    }
}
