//! Bar-by-bar execution simulator — the heart of the engine.
//!
//! Per bar i:
//! 1. Fill the order scheduled for bar i at bar i's open
//! 2. Read the signal flags for bar i (computed from bars ≤ i)
//! 3. If flat: schedule an entry for bar i+1's open
//! 4. If exposed: schedule an exit for bar i+1's open on an exit signal,
//!    a directional filter turning against the position, or a stop pierce
//! 5. Mark to market and append an equity point
//!
//! Bars with an invalid price skip 2–4 and carry equity forward. A position
//! still open after the final bar is force-liquidated.

use crate::components::filter::RegimeFilter;
use crate::components::indicator::{Indicator, IndicatorValues};
use crate::components::signal::{BarSignal, SignalFrame, SignalGenerator};
use crate::domain::{
    Bar, EquityPoint, ExitReason, Order, PendingOrder, Position, PositionSide, Trade,
};
use crate::error::BacktestError;
use crate::indicators::Atr;
use crate::sizers::SizingContext;
use tracing::{debug, info, warn};

use super::state::{EngineConfig, EngineState, RunResult};
use super::summary::Summary;

/// Generate signals with `generator` and run the simulation.
pub fn run_strategy(
    bars: &[Bar],
    generator: &dyn SignalGenerator,
    filter: Option<&RegimeFilter>,
    config: &EngineConfig,
) -> Result<RunResult, BacktestError> {
    let signals = generator.generate(bars);
    debug!(generator = generator.name(), bars = bars.len(), "signals generated");
    run_backtest(bars, &signals, filter, config)
}

/// Run a backtest over prepared bars and precomputed signals.
///
/// Fails with `InvalidInput` before simulating when the inputs are
/// inconsistent, and with `Computation` if an engine invariant breaks.
pub fn run_backtest(
    bars: &[Bar],
    signals: &SignalFrame,
    filter: Option<&RegimeFilter>,
    config: &EngineConfig,
) -> Result<RunResult, BacktestError> {
    validate_inputs(bars, signals, filter, config)?;

    let atr = precompute_atr(bars, config)?;
    let mut sim = Simulator {
        bars,
        signals,
        filter,
        config,
        atr: atr.as_deref(),
        state: EngineState::new(config.initial_capital),
        trades: Vec::new(),
        equity_curve: Vec::with_capacity(bars.len()),
    };

    for i in 0..bars.len() {
        sim.step(i)?;
    }
    sim.finish()
}

fn validate_inputs(
    bars: &[Bar],
    signals: &SignalFrame,
    filter: Option<&RegimeFilter>,
    config: &EngineConfig,
) -> Result<(), BacktestError> {
    config.validate()?;
    if bars.is_empty() {
        return Err(BacktestError::InvalidInput("bar sequence is empty".into()));
    }
    if let Some(pair) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
        return Err(BacktestError::InvalidInput(format!(
            "bar dates must be strictly increasing: {} followed by {}",
            pair[0].date, pair[1].date
        )));
    }
    // Sizing reads next_open, fills read the following open: they must agree.
    if let Some((i, pair)) = bars
        .windows(2)
        .enumerate()
        .find(|(_, w)| !next_open_matches(w[0].next_open, w[1].open))
    {
        return Err(BacktestError::InvalidInput(format!(
            "bar {i} ({}) next_open {:?} does not match the open {} of {}",
            pair[0].date, pair[0].next_open, pair[1].open, pair[1].date
        )));
    }
    signals.validate(bars.len())?;
    if let Some(f) = filter {
        f.validate(bars.len())?;
    }
    Ok(())
}

/// A missing following open may only pair with a missing `next_open`.
fn next_open_matches(next_open: Option<f64>, following_open: f64) -> bool {
    if following_open.is_finite() {
        next_open == Some(following_open)
    } else {
        next_open.map_or(true, |v| !v.is_finite())
    }
}

fn precompute_atr(bars: &[Bar], config: &EngineConfig) -> Result<Option<Vec<f64>>, BacktestError> {
    if !config.needs_atr() {
        return Ok(None);
    }
    let indicator = Atr::new(config.atr_period)?;
    let values = IndicatorValues::precompute(bars, &[&indicator]);
    Ok(values.get_series(indicator.name()).map(<[f64]>::to_vec))
}

struct Simulator<'a> {
    bars: &'a [Bar],
    signals: &'a SignalFrame,
    filter: Option<&'a RegimeFilter>,
    config: &'a EngineConfig,
    atr: Option<&'a [f64]>,
    state: EngineState,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
}

impl Simulator<'_> {
    fn step(&mut self, i: usize) -> Result<(), BacktestError> {
        let bars = self.bars;
        let bar = &bars[i];
        self.state.diagnostics.bars_processed += 1;

        // ─── 1. Fill pending order at this bar's open ───
        if self.state.pending.due_at(i).is_some() {
            self.fill_pending(i)?;
        }

        let valid = bar.has_valid_prices();
        if valid {
            self.state.last_valid_close = Some((i, bar.close));

            // ─── 2. Signals ───
            let signal = self.signals.at(i);

            // ─── 3/4. Schedule entry or exit ───
            if self.state.position.is_some() {
                self.consider_exit(i, &signal)?;
                self.ratchet_stop(i);
            } else if self.state.pending.is_none() {
                self.consider_entry(i, &signal)?;
            }
        } else {
            self.state.diagnostics.invalid_bars += 1;
            debug!(bar = i, date = %bar.date, "invalid bar, carrying equity forward");
        }

        // ─── 5. Mark to market ───
        let equity = match &self.state.position {
            None => self.state.ledger.cash(),
            Some(pos) => {
                let price = if valid {
                    bar.close
                } else {
                    self.state.carry_forward_price(pos)
                };
                self.state.ledger.mark(Some(pos), price)
            }
        };
        self.equity_curve.push(EquityPoint {
            date: bar.date,
            equity,
        });
        Ok(())
    }

    fn fill_pending(&mut self, i: usize) -> Result<(), BacktestError> {
        let bars = self.bars;
        let bar = &bars[i];
        let pending = self.state.pending.take();
        let Some(price) = bar.fillable_open() else {
            self.state.diagnostics.dropped_orders += 1;
            warn!(bar = i, date = %bar.date, order = ?pending, "fill price unavailable, order dropped");
            return Ok(());
        };

        match pending {
            PendingOrder::None => Ok(()),
            PendingOrder::Entry(order) => self.fill_entry(i, order, price),
            PendingOrder::Exit { order, reason } => self.fill_exit(i, order, price, reason),
        }
    }

    fn fill_entry(&mut self, i: usize, order: Order, price: f64) -> Result<(), BacktestError> {
        if self.state.position.is_some() {
            return Err(BacktestError::Computation(format!(
                "entry fill on bar {i} while a position is open"
            )));
        }
        if !(order.shares > 0.0 && order.shares.is_finite()) {
            return Err(BacktestError::Computation(format!(
                "entry fill on bar {i} with non-positive shares {}",
                order.shares
            )));
        }

        let bars = self.bars;
        let bar = &bars[i];
        self.state.ledger.open(order.side, price, order.shares);
        let stop_level = self.config.trailing_stop.and_then(|stop| {
            let atr = self.atr_at(order.signal_index)?;
            Some(price - order.side.sign() * stop.atr_multiple * atr)
        });
        let position = Position {
            side: order.side,
            entry_index: i,
            entry_date: bar.date,
            entry_price: price,
            shares: order.shares,
            stop_level,
        };

        self.state.diagnostics.entries_filled += 1;
        debug!(
            bar = i,
            date = %bar.date,
            side = ?position.side,
            price,
            shares = position.shares,
            stop = ?position.stop_level,
            cash = self.state.ledger.cash(),
            "entry filled"
        );
        self.state.position = Some(position);
        Ok(())
    }

    fn fill_exit(
        &mut self,
        i: usize,
        order: Order,
        price: f64,
        reason: ExitReason,
    ) -> Result<(), BacktestError> {
        let bars = self.bars;
        let bar = &bars[i];
        let Some(position) = self.state.position.take() else {
            return Err(BacktestError::Computation(format!(
                "exit fill on bar {i} with no open position"
            )));
        };
        if position.side != order.side {
            return Err(BacktestError::Computation(format!(
                "exit order side {:?} does not match position side {:?}",
                order.side, position.side
            )));
        }
        self.close_position(position, i, bar.date, price, reason)
    }

    fn close_position(
        &mut self,
        position: Position,
        exit_index: usize,
        exit_date: chrono::NaiveDate,
        price: f64,
        reason: ExitReason,
    ) -> Result<(), BacktestError> {
        if exit_index <= position.entry_index {
            return Err(BacktestError::Computation(format!(
                "exit index {exit_index} not after entry index {}",
                position.entry_index
            )));
        }

        let pnl = self.state.ledger.close(&position, price);
        let trade = Trade {
            side: position.side,
            entry_index: position.entry_index,
            entry_date: position.entry_date,
            entry_price: position.entry_price,
            exit_index,
            exit_date,
            exit_price: price,
            shares: position.shares,
            pnl,
            return_pct: Trade::return_on_cost(pnl, position.entry_price, position.shares),
            exit_reason: reason,
        };

        self.state.diagnostics.exits_filled += 1;
        debug!(
            exit_index,
            date = %exit_date,
            side = ?trade.side,
            price,
            pnl,
            reason = ?reason,
            cash = self.state.ledger.cash(),
            "exit filled"
        );
        self.trades.push(trade);
        Ok(())
    }

    fn consider_entry(&mut self, i: usize, signal: &BarSignal) -> Result<(), BacktestError> {
        if i + 1 >= self.bars.len() {
            return Ok(());
        }

        let side = if signal.long_entry && self.permits(PositionSide::Long, i) {
            PositionSide::Long
        } else if self.config.direction.allows_short()
            && signal.short_entry
            && self.permits(PositionSide::Short, i)
        {
            PositionSide::Short
        } else {
            return Ok(());
        };

        let bars = self.bars;
        let bar = &bars[i];
        let Some(fill_price) = bar.fillable_next_open() else {
            self.state.diagnostics.dropped_orders += 1;
            warn!(bar = i, date = %bar.date, side = ?side, "next open unavailable, entry dropped");
            return Ok(());
        };

        let cash = self.state.ledger.cash();
        let ctx = SizingContext {
            cash,
            equity: cash,
            fill_price,
            atr: self.atr_at(i),
        };
        let shares = self.config.execution.sizer().size(&ctx);
        if shares <= 0.0 {
            self.state.diagnostics.zero_size_entries += 1;
            debug!(bar = i, side = ?side, "entry sized to zero shares");
            return Ok(());
        }

        self.state.schedule(PendingOrder::Entry(Order {
            side,
            signal_index: i,
            fill_index: i + 1,
            scheduled_date: self.bars[i + 1].date,
            shares,
        }))
    }

    fn consider_exit(&mut self, i: usize, signal: &BarSignal) -> Result<(), BacktestError> {
        if i + 1 >= self.bars.len() || !self.state.pending.is_none() {
            return Ok(());
        }
        let Some(position) = &self.state.position else {
            return Ok(());
        };

        let bars = self.bars;
        let bar = &bars[i];
        let exit_signal = match position.side {
            PositionSide::Long => signal.long_exit,
            PositionSide::Short => signal.short_exit,
        };

        let reason = if position.stop_pierced(bar.high, bar.low) {
            ExitReason::TrailingStop
        } else if exit_signal {
            ExitReason::Signal
        } else if !self.permits(position.side, i) {
            ExitReason::RegimeFilter
        } else {
            return Ok(());
        };

        let order = Order {
            side: position.side,
            signal_index: i,
            fill_index: i + 1,
            scheduled_date: self.bars[i + 1].date,
            shares: position.shares,
        };
        debug!(bar = i, reason = ?reason, exposure = ?self.state.exposure(), "exit scheduled");
        self.state.schedule(PendingOrder::Exit { order, reason })
    }

    /// Tighten the stop using this bar's close and ATR, for use from the next bar.
    fn ratchet_stop(&mut self, i: usize) {
        let Some(stop) = self.config.trailing_stop else {
            return;
        };
        let Some(atr) = self.atr_at(i) else {
            return;
        };
        let close = self.bars[i].close;
        if let Some(position) = self.state.position.as_mut() {
            let candidate = close - position.side.sign() * stop.atr_multiple * atr;
            position.ratchet_stop(candidate);
        }
    }

    fn permits(&self, side: PositionSide, i: usize) -> bool {
        self.filter.map_or(true, |f| f.permits(side, i))
    }

    fn atr_at(&self, i: usize) -> Option<f64> {
        self.atr
            .and_then(|a| a.get(i).copied())
            .filter(|v| v.is_finite() && *v > 0.0)
    }

    // ─── Terminal ───

    fn finish(mut self) -> Result<RunResult, BacktestError> {
        if !self.state.pending.is_none() {
            return Err(BacktestError::Computation(format!(
                "order still pending after the final bar: {:?}",
                self.state.pending
            )));
        }

        let n = self.bars.len();
        let bars = self.bars;
        let last = &bars[n - 1];
        if let Some(position) = self.state.position.take() {
            // The last mark must reconcile before the position is liquidated.
            let mark = if last.has_valid_prices() {
                last.close
            } else {
                self.state.carry_forward_price(&position)
            };
            let marked_equity = self
                .equity_curve
                .last()
                .map_or(self.config.initial_capital, |p| p.equity);
            let unrealized = self.state.ledger.unrealized_pnl(Some(&position), mark);
            self.state.ledger.check_closure(marked_equity, unrealized)?;

            let price = last
                .fillable_next_open()
                .or_else(|| (last.close.is_finite() && last.close > 0.0).then_some(last.close))
                .unwrap_or_else(|| self.state.carry_forward_price(&position));
            self.state.diagnostics.forced_liquidation = true;
            self.close_position(position, n, last.date, price, ExitReason::EndOfData)?;
            if let Some(point) = self.equity_curve.last_mut() {
                point.equity = self.state.ledger.cash();
            }
        }

        let initial = self.config.initial_capital;
        let final_equity = self
            .equity_curve
            .last()
            .map_or(initial, |p| p.equity);
        self.state.ledger.check_closure(final_equity, 0.0)?;
        if self.equity_curve.len() != n {
            return Err(BacktestError::Computation(format!(
                "equity curve has {} points for {n} bars",
                self.equity_curve.len()
            )));
        }

        let summary = Summary::compute(initial, final_equity, &self.trades);
        info!(
            bars = n,
            trades = summary.trade_count,
            final_equity = summary.final_equity,
            total_return_pct = summary.total_return_pct,
            win_rate_pct = summary.win_rate_pct,
            dropped_orders = self.state.diagnostics.dropped_orders,
            invalid_bars = self.state.diagnostics.invalid_bars,
            "backtest complete"
        );

        Ok(RunResult {
            equity_curve: self.equity_curve,
            trades: self.trades,
            summary,
            diagnostics: self.state.diagnostics,
        })
    }
}
