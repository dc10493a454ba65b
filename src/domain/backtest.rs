//! Backtest driver.
//!
//! Two stages: the pure moving-average/signal stage over the whole history, then
//! a sequential fold in which the accountant carries one `PortfolioState` forward
//! row by row. Every output series is aligned with the input rows.

use chrono::NaiveDate;

use crate::domain::config_validation::{validate_config, validate_history};
use crate::domain::error::RebalancerError;
use crate::domain::moving_average::{build_moving_averages, warmup_index, MovingAverageRecord};
use crate::domain::portfolio::{Accountant, Charges, PortfolioState, TransactionRecord, TransferShares};
use crate::domain::price_history::PriceHistory;
use crate::domain::signal::{generate_signals, RatioBand, SignalRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub starting_value: f64,
    pub starting_equity_share: f64,
    pub starting_bond_share: f64,
    pub equity_charge: f64,
    pub bond_charge: f64,
    pub short_window: usize,
    pub long_window: usize,
    pub min_rebalance_gap: usize,
    pub ratio_lower_bound: f64,
    pub ratio_upper_bound: f64,
    pub ratio_bound_scale: f64,
    pub ratio_precision: u32,
    pub shares: TransferShares,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            starting_value: 100_000.0,
            starting_equity_share: 0.8,
            starting_bond_share: 0.2,
            equity_charge: 0.003,
            bond_charge: 0.002,
            short_window: 30,
            long_window: 200,
            min_rebalance_gap: 30,
            ratio_lower_bound: 0.4,
            ratio_upper_bound: 0.7,
            ratio_bound_scale: 100.0,
            ratio_precision: 5,
            shares: TransferShares::default(),
        }
    }
}

impl BacktestConfig {
    pub fn charges(&self) -> Charges {
        Charges {
            equity: self.equity_charge,
            bond: self.bond_charge,
        }
    }

    /// Ratio bounds in the units of the rounded index ratio.
    pub fn ratio_band(&self) -> RatioBand {
        RatioBand {
            lower: self.ratio_lower_bound * self.ratio_bound_scale,
            upper: self.ratio_upper_bound * self.ratio_bound_scale,
        }
    }

    pub fn warmup_index(&self) -> usize {
        warmup_index(self.short_window, self.long_window)
    }

    /// Minimum number of rows a price history needs for both windows to fill.
    pub fn min_rows(&self) -> usize {
        self.short_window.max(self.long_window)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub warmup_date: NaiveDate,
    /// Value lost to charges when the starting capital was allocated.
    pub initial_charges: f64,
    pub moving_averages: Vec<MovingAverageRecord>,
    pub signals: Vec<SignalRecord>,
    pub portfolio: Vec<PortfolioState>,
    pub transactions: Vec<TransactionRecord>,
}

impl BacktestResult {
    pub fn final_state(&self) -> Option<&PortfolioState> {
        self.portfolio.last()
    }

    /// Portfolio rows from the warm-up boundary onward.
    pub fn valued(&self) -> &[PortfolioState] {
        let start = self
            .portfolio
            .iter()
            .position(|s| s.date == self.warmup_date)
            .unwrap_or(self.portfolio.len());
        &self.portfolio[start..]
    }
}

pub fn run_backtest(
    history: &PriceHistory,
    config: &BacktestConfig,
) -> Result<BacktestResult, RebalancerError> {
    validate_config(config)?;
    validate_history(history, config)?;

    let warmup = config.warmup_index();
    let bars = history.bars();
    let warmup_date = bars[warmup].date;

    tracing::info!(
        rows = bars.len(),
        %warmup_date,
        short_window = config.short_window,
        long_window = config.long_window,
        "computing moving averages and signals"
    );

    let moving_averages = build_moving_averages(
        history,
        config.short_window,
        config.long_window,
        config.ratio_precision,
    );
    let signals = generate_signals(
        &moving_averages,
        warmup,
        config.ratio_band(),
        config.min_rebalance_gap,
    )?;

    let mut accountant = Accountant::new(config.charges(), config.shares);
    let mut portfolio = Vec::with_capacity(bars.len());
    let mut transactions = Vec::with_capacity(bars.len());
    let mut initial_charges = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        if bar.date < warmup_date {
            portfolio.push(PortfolioState::empty(bar.date));
            transactions.push(TransactionRecord::zero(bar.date));
        } else if bar.date == warmup_date {
            let state = accountant.initialize(
                bar.date,
                config.starting_value,
                config.starting_equity_share,
                config.starting_bond_share,
            );
            let allocated = config.starting_value
                * (config.starting_equity_share + config.starting_bond_share);
            initial_charges = allocated - state.total;
            portfolio.push(state);
            transactions.push(TransactionRecord::zero(bar.date));
        } else {
            let (state, transaction) = accountant.step(&bars[i - 1], bar, &signals[i])?;
            portfolio.push(state);
            transactions.push(transaction);
        }
    }

    if let Some(last) = portfolio.last() {
        tracing::info!(date = %last.date, total = last.total, "backtest complete");
    }

    Ok(BacktestResult {
        warmup_date,
        initial_charges,
        moving_averages,
        signals,
        portfolio,
        transactions,
    })
}
