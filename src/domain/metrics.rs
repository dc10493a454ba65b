//! Aggregate statistics for a finished backtest.

use super::backtest::BacktestResult;
use super::portfolio::{PortfolioState, Rebalance};

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub final_value: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub trading_days: usize,
    pub equity_buys: usize,
    pub equity_sells: usize,
    pub bond_sells: usize,
    pub bond_buys: usize,
    pub dropped_intents: usize,
    pub total_charges: f64,
}

impl Summary {
    pub fn compute(result: &BacktestResult, starting_value: f64) -> Self {
        let valued = result.valued();

        let final_value = result.final_state().map(|s| s.total).unwrap_or(0.0);
        let total_return = if starting_value > 0.0 {
            (final_value - starting_value) / starting_value
        } else {
            0.0
        };

        let mut equity_buys = 0usize;
        let mut equity_sells = 0usize;
        let mut bond_sells = 0usize;
        let mut bond_buys = 0usize;
        let mut dropped_intents = 0usize;

        for signal in &result.signals {
            match Rebalance::select(signal) {
                Some(Rebalance::EquityBuy) => equity_buys += 1,
                Some(Rebalance::EquitySell) => equity_sells += 1,
                Some(Rebalance::BondSell) => bond_sells += 1,
                Some(Rebalance::BondBuy) => bond_buys += 1,
                None => {}
            }
            if signal.equity.is_trade() && signal.bond.is_trade() {
                dropped_intents += 1;
            }
        }

        let leaked: f64 = result
            .transactions
            .iter()
            .map(|t| t.leakage())
            .filter(|l| *l > 0.0)
            .sum();

        Summary {
            final_value,
            total_return,
            max_drawdown: compute_drawdown(valued),
            trading_days: valued.len(),
            equity_buys,
            equity_sells,
            bond_sells,
            bond_buys,
            dropped_intents,
            total_charges: result.initial_charges + leaked,
        }
    }

    pub fn rebalances(&self) -> usize {
        self.equity_buys + self.equity_sells + self.bond_sells + self.bond_buys
    }
}

/// Largest peak-to-trough decline of the total value, as a fraction of the peak.
fn compute_drawdown(states: &[PortfolioState]) -> f64 {
    let Some(first) = states.first() else {
        return 0.0;
    };

    let mut peak = first.total;
    let mut max_dd = 0.0_f64;

    for state in states {
        if state.total > peak {
            peak = state.total;
        } else if peak > 0.0 {
            let dd = (peak - state.total) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
