//! Bar preparation: raw provider rows → engine-ready bars.
//!
//! Sorts by date, drops rows with a missing price, rejects duplicate dates,
//! and attaches each bar's `next_open`.

use super::provider::{DataError, RawBar};
use crate::domain::Bar;
use tracing::debug;

pub fn prepare_bars(symbol: &str, mut raw: Vec<RawBar>) -> Result<Vec<Bar>, DataError> {
    raw.sort_by_key(|r| r.date);

    let before = raw.len();
    raw.retain(|r| {
        [r.open, r.high, r.low, r.close, r.adj_close]
            .iter()
            .all(|p| p.is_finite())
    });
    let dropped = before - raw.len();
    if dropped > 0 {
        debug!(symbol, dropped, "dropped rows with missing prices");
    }

    if raw.is_empty() {
        return Err(DataError::NoData(symbol.to_string()));
    }

    if let Some(pair) = raw.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(DataError::Validation(format!(
            "duplicate date {} for {symbol}",
            pair[0].date
        )));
    }

    let next_opens: Vec<Option<f64>> = raw
        .iter()
        .skip(1)
        .map(|r| Some(r.open))
        .chain(std::iter::once(None))
        .collect();

    Ok(raw
        .into_iter()
        .zip(next_opens)
        .map(|(r, next_open)| Bar {
            date: r.date,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            adj_close: r.adj_close,
            volume: r.volume,
            next_open,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(day: u32, open: f64) -> RawBar {
        RawBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open,
            high: open + 1.0,
            low: open - 1.0,
            close: open + 0.5,
            adj_close: open + 0.5,
            volume: 100,
        }
    }

    #[test]
    fn sorts_and_attaches_next_open() {
        let bars = prepare_bars("NHY", vec![raw(4, 12.0), raw(2, 10.0), raw(3, 11.0)]).unwrap();
        let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
        assert_eq!(opens, vec![10.0, 11.0, 12.0]);
        assert_eq!(bars[0].next_open, Some(11.0));
        assert_eq!(bars[1].next_open, Some(12.0));
        assert_eq!(bars[2].next_open, None);
    }

    #[test]
    fn drops_rows_with_missing_prices() {
        let mut bad = raw(3, 11.0);
        bad.adj_close = f64::NAN;
        let bars = prepare_bars("NHY", vec![raw(2, 10.0), bad, raw(4, 12.0)]).unwrap();
        assert_eq!(bars.len(), 2);
        // next_open skips the dropped row.
        assert_eq!(bars[0].next_open, Some(12.0));
    }

    #[test]
    fn duplicate_dates_rejected() {
        let err = prepare_bars("NHY", vec![raw(2, 10.0), raw(2, 10.5)]).unwrap_err();
        assert!(matches!(err, DataError::Validation(_)));
    }

    #[test]
    fn nothing_usable_is_no_data() {
        let mut bad = raw(2, 10.0);
        bad.close = f64::NAN;
        assert!(matches!(prepare_bars("NHY", vec![bad]), Err(DataError::NoData(_))));
        assert!(matches!(prepare_bars("NHY", vec![]), Err(DataError::NoData(_))));
    }
}
