//! Daily price row for the two traded instruments.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    Equity,
    Bond,
}

impl Instrument {
    pub const ALL: [Instrument; 2] = [Instrument::Equity, Instrument::Bond];
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instrument::Equity => f.write_str("equity"),
            Instrument::Bond => f.write_str("bond"),
        }
    }
}

/// One aligned observation: equity index and bond index closing values.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub equity: f64,
    pub bond: f64,
}

impl PriceBar {
    pub fn price(&self, instrument: Instrument) -> f64 {
        match instrument {
            Instrument::Equity => self.equity,
            Instrument::Bond => self.bond,
        }
    }

    /// equity / bond, rounded to `precision` decimals.
    pub fn ratio(&self, precision: u32) -> f64 {
        round_to(self.equity / self.bond, precision)
    }
}

pub(crate) fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
