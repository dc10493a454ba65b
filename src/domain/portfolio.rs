//! Portfolio state and the day-by-day accounting transition.
//!
//! The accountant owns the running `PortfolioState`. Each post-initialization row
//! moves it forward exactly once: optional rebalance flows first, then every
//! holding is revalued by its own price return and credited with that row's flow.

use crate::domain::error::{RebalancerError, Stage};
use crate::domain::price::{Instrument, PriceBar};
use crate::domain::signal::{SignalRecord, TradeIntent};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioState {
    pub date: NaiveDate,
    pub equity: f64,
    pub bond: f64,
    pub total: f64,
}

impl PortfolioState {
    pub fn new(date: NaiveDate, equity: f64, bond: f64) -> Self {
        Self {
            date,
            equity,
            bond,
            total: equity + bond,
        }
    }

    /// Placeholder for rows before the portfolio is initialised.
    pub fn empty(date: NaiveDate) -> Self {
        Self::new(date, 0.0, 0.0)
    }

    pub fn holding(&self, instrument: Instrument) -> f64 {
        match instrument {
            Instrument::Equity => self.equity,
            Instrument::Bond => self.bond,
        }
    }
}

/// Signed cash flow into each holding on one row. Positive credits the holding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub equity: f64,
    pub bond: f64,
}

impl TransactionRecord {
    pub fn zero(date: NaiveDate) -> Self {
        Self {
            date,
            equity: 0.0,
            bond: 0.0,
        }
    }

    /// Value lost to charges on this row (zero on quiet rows).
    pub fn leakage(&self) -> f64 {
        -(self.equity + self.bond)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Charges {
    pub equity: f64,
    pub bond: f64,
}

impl Charges {
    pub fn of(&self, instrument: Instrument) -> f64 {
        match instrument {
            Instrument::Equity => self.equity,
            Instrument::Bond => self.bond,
        }
    }
}

/// Fraction of the funding leg moved by each kind of rebalance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferShares {
    pub bond_sold_on_equity_buy: f64,
    pub equity_sold_on_equity_sell: f64,
    pub bond_sold_on_bond_sell: f64,
    pub equity_sold_on_bond_buy: f64,
}

impl Default for TransferShares {
    fn default() -> Self {
        TransferShares {
            bond_sold_on_equity_buy: 1.0,
            equity_sold_on_equity_sell: 1.0,
            bond_sold_on_bond_sell: 1.0,
            equity_sold_on_bond_buy: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rebalance {
    EquityBuy,
    EquitySell,
    BondSell,
    BondBuy,
}

impl Rebalance {
    /// At most one rebalance per row: equity-BUY, equity-SELL, bond-SELL, bond-BUY.
    pub fn select(signal: &SignalRecord) -> Option<Self> {
        match (signal.equity, signal.bond) {
            (TradeIntent::Buy, _) => Some(Rebalance::EquityBuy),
            (TradeIntent::Sell, _) => Some(Rebalance::EquitySell),
            (TradeIntent::None, TradeIntent::Sell) => Some(Rebalance::BondSell),
            (TradeIntent::None, TradeIntent::Buy) => Some(Rebalance::BondBuy),
            (TradeIntent::None, TradeIntent::None) => None,
        }
    }

    /// Holding that pays for the transfer.
    pub fn source(&self) -> Instrument {
        match self {
            Rebalance::EquityBuy | Rebalance::BondSell => Instrument::Bond,
            Rebalance::EquitySell | Rebalance::BondBuy => Instrument::Equity,
        }
    }

    pub fn share(&self, shares: &TransferShares) -> f64 {
        match self {
            Rebalance::EquityBuy => shares.bond_sold_on_equity_buy,
            Rebalance::EquitySell => shares.equity_sold_on_equity_sell,
            Rebalance::BondSell => shares.bond_sold_on_bond_sell,
            Rebalance::BondBuy => shares.equity_sold_on_bond_buy,
        }
    }
}

/// Flows for one rebalance. The funding leg pays its own charge; the receiving
/// leg is net of both charges.
pub fn rebalance_flows(
    rebalance: Rebalance,
    prev: &PortfolioState,
    prev_bar: &PriceBar,
    bar: &PriceBar,
    charges: &Charges,
    shares: &TransferShares,
) -> Result<TransactionRecord, RebalancerError> {
    let source = rebalance.source();
    let revalued = revalue(
        prev.holding(source),
        prev_bar,
        bar,
        source,
        Stage::Rebalance,
    )?;
    let moved = revalued * rebalance.share(shares);

    let outflow = -moved * (1.0 - charges.of(source));
    let inflow = moved * (1.0 - charges.equity) * (1.0 - charges.bond);

    let (equity, bond) = match source {
        Instrument::Bond => (inflow, outflow),
        Instrument::Equity => (outflow, inflow),
    };

    Ok(TransactionRecord {
        date: bar.date,
        equity,
        bond,
    })
}

/// `holding * price[t] / price[t-1]`, failing on an undefined multiplier.
fn revalue(
    holding: f64,
    prev_bar: &PriceBar,
    bar: &PriceBar,
    instrument: Instrument,
    stage: Stage,
) -> Result<f64, RebalancerError> {
    let prev_price = prev_bar.price(instrument);
    let price = bar.price(instrument);
    let value = holding * price / prev_price;

    if !(prev_price > 0.0 && price > 0.0) || !value.is_finite() {
        return Err(RebalancerError::Simulation {
            date: bar.date,
            instrument,
            stage,
            reason: format!(
                "undefined return multiplier ({} -> {})",
                prev_price, price
            ),
        });
    }
    Ok(value)
}

#[derive(Debug, Clone)]
pub struct Accountant {
    charges: Charges,
    shares: TransferShares,
    state: Option<PortfolioState>,
}

impl Accountant {
    pub fn new(charges: Charges, shares: TransferShares) -> Self {
        Self {
            charges,
            shares,
            state: None,
        }
    }

    pub fn state(&self) -> Option<&PortfolioState> {
        self.state.as_ref()
    }

    /// Initial allocation, each leg net of its own charge.
    pub fn initialize(
        &mut self,
        date: NaiveDate,
        starting_value: f64,
        equity_share: f64,
        bond_share: f64,
    ) -> PortfolioState {
        let state = PortfolioState::new(
            date,
            starting_value * equity_share * (1.0 - self.charges.equity),
            starting_value * bond_share * (1.0 - self.charges.bond),
        );
        self.state = Some(state);
        state
    }

    /// Advances the portfolio from `prev_bar` to `bar`.
    pub fn step(
        &mut self,
        prev_bar: &PriceBar,
        bar: &PriceBar,
        signal: &SignalRecord,
    ) -> Result<(PortfolioState, TransactionRecord), RebalancerError> {
        let prev = self.state.ok_or_else(|| RebalancerError::Simulation {
            date: bar.date,
            instrument: Instrument::Equity,
            stage: Stage::HoldingUpdate,
            reason: "portfolio stepped before initialization".into(),
        })?;

        let transaction = match Rebalance::select(signal) {
            Some(rebalance) => {
                if signal.equity.is_trade() && signal.bond.is_trade() {
                    tracing::warn!(
                        date = %bar.date,
                        bond_intent = signal.bond.direction(),
                        "bond intent not executed, equity intent takes precedence"
                    );
                }
                let flows =
                    rebalance_flows(rebalance, &prev, prev_bar, bar, &self.charges, &self.shares)?;
                tracing::debug!(
                    date = %bar.date,
                    ?rebalance,
                    equity_flow = flows.equity,
                    bond_flow = flows.bond,
                    "rebalance"
                );
                flows
            }
            None => TransactionRecord::zero(bar.date),
        };

        let equity = revalue(prev.equity, prev_bar, bar, Instrument::Equity, Stage::HoldingUpdate)?
            + transaction.equity;
        let bond = revalue(prev.bond, prev_bar, bar, Instrument::Bond, Stage::HoldingUpdate)?
            + transaction.bond;

        let state = PortfolioState::new(bar.date, equity, bond);
        self.state = Some(state);
        Ok((state, transaction))
    }
}
