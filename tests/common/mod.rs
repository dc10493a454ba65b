#![allow(dead_code)]

use chrono::NaiveDate;
use rebalancer::domain::backtest::BacktestConfig;
use rebalancer::domain::error::RebalancerError;
pub use rebalancer::domain::price::PriceBar;
use rebalancer::domain::price_history::PriceHistory;
use rebalancer::ports::data_port::PriceDataPort;

pub struct MockPriceDataPort {
    pub bars: Vec<PriceBar>,
    pub error: Option<String>,
}

impl MockPriceDataPort {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            bars: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl PriceDataPort for MockPriceDataPort {
    fn load_prices(&self) -> Result<Vec<PriceBar>, RebalancerError> {
        if let Some(reason) = &self.error {
            return Err(RebalancerError::DataRead {
                reason: reason.clone(),
            });
        }
        Ok(self.bars.clone())
    }

    fn data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, RebalancerError> {
        let bars = self.load_prices()?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date_str: &str, equity: f64, bond: f64) -> PriceBar {
    PriceBar {
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        equity,
        bond,
    }
}

/// Consecutive calendar days starting 2024-01-01.
pub fn make_bars(equity: &[f64], bond: &[f64]) -> Vec<PriceBar> {
    assert_eq!(equity.len(), bond.len());
    let start = date(2024, 1, 1);
    equity
        .iter()
        .zip(bond)
        .enumerate()
        .map(|(i, (&e, &b))| PriceBar {
            date: start + chrono::Duration::days(i as i64),
            equity: e,
            bond: b,
        })
        .collect()
}

pub fn make_history(equity: &[f64], bond: &[f64]) -> PriceHistory {
    PriceHistory::new(make_bars(equity, bond)).unwrap()
}

/// Smooth oscillating series long enough for small windows to cross several times.
pub fn wave(len: usize, base: f64, amplitude: f64, period: f64) -> Vec<f64> {
    (0..len)
        .map(|i| base + amplitude * (i as f64 * std::f64::consts::TAU / period).sin())
        .collect()
}

/// Historical parameters with windows small enough for hand-built series.
pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        short_window: 1,
        long_window: 2,
        min_rebalance_gap: 0,
        ..BacktestConfig::default()
    }
}
