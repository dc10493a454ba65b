//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::RebalancerError;
use std::path::Path;

/// Port for writing backtest output series.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), RebalancerError>;
}
