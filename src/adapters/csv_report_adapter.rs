//! CSV report adapter implementing ReportPort.
//!
//! Writes one file per output series into the target directory, one row per
//! input date.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RebalancerError;
use crate::ports::report_port::ReportPort;

pub const PORTFOLIO_FILE: &str = "portfolio.csv";
pub const SIGNALS_FILE: &str = "signals.csv";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";
pub const MOVING_AVERAGES_FILE: &str = "moving_averages.csv";

#[derive(Serialize)]
struct PortfolioRow {
    date: String,
    equity: f64,
    bond: f64,
    total: f64,
}

#[derive(Serialize)]
struct SignalRow {
    date: String,
    equity: i8,
    bond: i8,
}

#[derive(Serialize)]
struct TransactionRow {
    date: String,
    equity: f64,
    bond: f64,
}

#[derive(Serialize)]
struct MovingAverageRow {
    date: String,
    equity_short: f64,
    equity_long: f64,
    bond_short: f64,
    bond_long: f64,
    ratio: f64,
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn write_rows<T: Serialize>(
    path: &Path,
    rows: impl IntoIterator<Item = T>,
) -> Result<(), RebalancerError> {
    let report_error = |e: csv::Error| RebalancerError::Report {
        reason: format!("{}: {}", path.display(), e),
    };

    let mut writer = csv::Writer::from_path(path).map_err(report_error)?;
    for row in rows {
        writer.serialize(row).map_err(report_error)?;
    }
    writer.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), RebalancerError> {
        fs::create_dir_all(output_dir)?;

        write_rows(
            &output_dir.join(PORTFOLIO_FILE),
            result.portfolio.iter().map(|s| PortfolioRow {
                date: s.date.to_string(),
                equity: s.equity,
                bond: s.bond,
                total: s.total,
            }),
        )?;

        write_rows(
            &output_dir.join(SIGNALS_FILE),
            result.signals.iter().map(|s| SignalRow {
                date: s.date.to_string(),
                equity: s.equity.direction(),
                bond: s.bond.direction(),
            }),
        )?;

        write_rows(
            &output_dir.join(TRANSACTIONS_FILE),
            result.transactions.iter().map(|t| TransactionRow {
                date: t.date.to_string(),
                equity: t.equity,
                bond: t.bond,
            }),
        )?;

        write_rows(
            &output_dir.join(MOVING_AVERAGES_FILE),
            result.moving_averages.iter().map(|m| MovingAverageRow {
                date: m.date.to_string(),
                equity_short: m.equity.short,
                equity_long: m.equity.long,
                bond_short: m.bond.short,
                bond_long: m.bond.long,
                ratio: m.ratio,
            }),
        )?;

        tracing::info!(dir = %output_dir.display(), "reports written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::moving_average::{MovingAverageRecord, MovingAverages};
    use crate::domain::portfolio::{PortfolioState, TransactionRecord};
    use crate::domain::signal::{SignalRecord, TradeIntent};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_result() -> BacktestResult {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        BacktestResult {
            warmup_date: d1,
            initial_charges: 280.0,
            moving_averages: vec![
                MovingAverageRecord {
                    date: d1,
                    valid: true,
                    equity: MovingAverages { short: 1.5, long: 2.0 },
                    bond: MovingAverages { short: 0.5, long: 0.25 },
                    ratio: 3.0,
                },
                MovingAverageRecord {
                    date: d2,
                    valid: true,
                    equity: MovingAverages { short: 2.5, long: 2.0 },
                    bond: MovingAverages { short: 0.5, long: 0.25 },
                    ratio: 3.5,
                },
            ],
            signals: vec![
                SignalRecord::none(d1),
                SignalRecord {
                    date: d2,
                    equity: TradeIntent::Buy,
                    bond: TradeIntent::Sell,
                },
            ],
            portfolio: vec![
                PortfolioState::new(d1, 79_760.0, 19_960.0),
                PortfolioState::new(d2, 99_500.0, 0.0),
            ],
            transactions: vec![
                TransactionRecord::zero(d1),
                TransactionRecord {
                    date: d2,
                    equity: 19_800.0,
                    bond: -19_920.0,
                },
            ],
        }
    }

    #[test]
    fn writes_all_series() {
        let dir = TempDir::new().unwrap();
        CsvReportAdapter::new()
            .write(&sample_result(), dir.path())
            .unwrap();

        for name in [PORTFOLIO_FILE, SIGNALS_FILE, TRANSACTIONS_FILE, MOVING_AVERAGES_FILE] {
            assert!(dir.path().join(name).exists(), "{} missing", name);
        }
    }

    #[test]
    fn signals_are_encoded_as_directions() {
        let dir = TempDir::new().unwrap();
        CsvReportAdapter::new()
            .write(&sample_result(), dir.path())
            .unwrap();

        let content = fs::read_to_string(dir.path().join(SIGNALS_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "date,equity,bond");
        assert_eq!(lines[1], "2024-01-01,0,0");
        assert_eq!(lines[2], "2024-01-02,1,-1");
    }

    #[test]
    fn portfolio_rows_carry_total() {
        let dir = TempDir::new().unwrap();
        CsvReportAdapter::new()
            .write(&sample_result(), dir.path())
            .unwrap();

        let content = fs::read_to_string(dir.path().join(PORTFOLIO_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "date,equity,bond,total");
        assert!(lines[1].starts_with("2024-01-01,79760"));
        assert!(lines[1].ends_with(",99720.0"));
    }

    #[test]
    fn creates_missing_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("runs").join("latest");
        CsvReportAdapter::new()
            .write(&sample_result(), &nested)
            .unwrap();
        assert!(nested.join(MOVING_AVERAGES_FILE).exists());
    }
}
