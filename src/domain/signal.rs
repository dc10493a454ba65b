//! Trade-intent generation: moving-average crossovers, ratio band crossings
//! and the per-instrument cooldown.
//!
//! Equity BUY:  short crosses long from below, or ratio falls through the lower bound.
//! Equity SELL: short crosses long from above, or ratio rises through the upper bound.
//! Bond BUY/SELL: crossover of the bond's own averages only.
//! BUY is evaluated first. A raw BUY/SELL survives only if the instrument had no
//! non-NONE intent in the preceding `min_rebalance_gap` rows.

use crate::domain::error::{RebalancerError, Stage};
use crate::domain::moving_average::{MovingAverageRecord, MovingAverages};
use crate::domain::price::Instrument;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradeIntent {
    Buy,
    Sell,
    #[default]
    None,
}

impl TradeIntent {
    /// Numeric direction used by reporting: +1 buy, -1 sell, 0 none.
    pub fn direction(&self) -> i8 {
        match self {
            TradeIntent::Buy => 1,
            TradeIntent::Sell => -1,
            TradeIntent::None => 0,
        }
    }

    pub fn is_trade(&self) -> bool {
        *self != TradeIntent::None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    pub date: NaiveDate,
    pub equity: TradeIntent,
    pub bond: TradeIntent,
}

impl SignalRecord {
    pub fn none(date: NaiveDate) -> Self {
        Self {
            date,
            equity: TradeIntent::None,
            bond: TradeIntent::None,
        }
    }

    pub fn intent(&self, instrument: Instrument) -> TradeIntent {
        match instrument {
            Instrument::Equity => self.equity,
            Instrument::Bond => self.bond,
        }
    }
}

/// Ratio band, already expressed in the units of the rounded price ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioBand {
    pub lower: f64,
    pub upper: f64,
}

pub fn crossed_above(prev: MovingAverages, cur: MovingAverages) -> bool {
    cur.short > cur.long && prev.short <= prev.long
}

pub fn crossed_below(prev: MovingAverages, cur: MovingAverages) -> bool {
    cur.short < cur.long && prev.short >= prev.long
}

pub fn raw_equity_intent(
    prev: &MovingAverageRecord,
    cur: &MovingAverageRecord,
    band: RatioBand,
) -> TradeIntent {
    let fell_through_lower = cur.ratio <= band.lower && prev.ratio > band.lower;
    let rose_through_upper = cur.ratio >= band.upper && prev.ratio < band.upper;

    if crossed_above(prev.equity, cur.equity) || fell_through_lower {
        TradeIntent::Buy
    } else if crossed_below(prev.equity, cur.equity) || rose_through_upper {
        TradeIntent::Sell
    } else {
        TradeIntent::None
    }
}

pub fn raw_bond_intent(prev: &MovingAverageRecord, cur: &MovingAverageRecord) -> TradeIntent {
    if crossed_above(prev.bond, cur.bond) {
        TradeIntent::Buy
    } else if crossed_below(prev.bond, cur.bond) {
        TradeIntent::Sell
    } else {
        TradeIntent::None
    }
}

/// Tracks the last row on which an instrument carried a non-NONE intent.
#[derive(Debug, Clone, Default)]
pub struct Cooldown {
    gap: usize,
    last_trade: Option<usize>,
}

impl Cooldown {
    pub fn new(gap: usize) -> Self {
        Self {
            gap,
            last_trade: None,
        }
    }

    /// Passes `raw` through if the trailing `gap` rows before `index` were all
    /// NONE, otherwise forces NONE. Records surviving trades.
    pub fn filter(&mut self, index: usize, raw: TradeIntent) -> TradeIntent {
        if !raw.is_trade() {
            return TradeIntent::None;
        }
        let clear = match self.last_trade {
            Some(last) => index - last > self.gap,
            None => true,
        };
        if clear {
            self.last_trade = Some(index);
            raw
        } else {
            TradeIntent::None
        }
    }
}

/// One `SignalRecord` per row. Rows up to and including `warmup` are NONE.
pub fn generate_signals(
    records: &[MovingAverageRecord],
    warmup: usize,
    band: RatioBand,
    min_rebalance_gap: usize,
) -> Result<Vec<SignalRecord>, RebalancerError> {
    let mut equity_cooldown = Cooldown::new(min_rebalance_gap);
    let mut bond_cooldown = Cooldown::new(min_rebalance_gap);
    let mut signals = Vec::with_capacity(records.len());

    for (i, cur) in records.iter().enumerate() {
        if i <= warmup {
            signals.push(SignalRecord::none(cur.date));
            continue;
        }

        let prev = &records[i - 1];
        if !(prev.valid && cur.valid) {
            return Err(RebalancerError::Simulation {
                date: cur.date,
                instrument: Instrument::Equity,
                stage: Stage::Signal,
                reason: "moving averages undefined after warm-up boundary".into(),
            });
        }

        signals.push(SignalRecord {
            date: cur.date,
            equity: equity_cooldown.filter(i, raw_equity_intent(prev, cur, band)),
            bond: bond_cooldown.filter(i, raw_bond_intent(prev, cur)),
        });
    }

    Ok(signals)
}
